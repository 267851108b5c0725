use anyhow::Result;
use async_trait::async_trait;

use crate::model::Document;

/// Whole-document access to the remote copy, addressed by one fixed record id.
///
/// Any error (network, auth, malformed response) is a plain failure to the
/// caller; nothing inspects its cause.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(None)` when the record does not exist yet.
    async fn pull(&self) -> Result<Option<Document>>;

    async fn push(&self, doc: &Document) -> Result<()>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "remote"
    }

    /// Identity of the record this adapter reads and writes. Two adapters
    /// with the same target are the same remote.
    fn target(&self) -> Option<String> {
        None
    }
}
