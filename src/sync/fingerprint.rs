use std::fmt;

use anyhow::Result;

use crate::model::Document;

/// Content hash of a push payload, used to skip pushes that would not change
/// the remote document.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// blake3 over the document's canonical JSON encoding. Struct fields
    /// serialize in declaration order, so equal documents hash equally.
    pub fn of(doc: &Document) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, doc)?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to correlate log lines.
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}
