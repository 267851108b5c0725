use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::model::Document;
use crate::sync::remote::RemoteStore;

#[derive(Debug, Default)]
pub struct MockState {
    pub document: Option<Document>,
    pub pushes: Vec<Document>,
    pub pulls: usize,
    pub fail_push: bool,
    pub fail_pull: bool,
}

/// Pure in-memory remote store for tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    pub state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        let remote = Self::new();
        remote.state.lock().unwrap().document = Some(doc);
        remote
    }

    pub fn push_count(&self) -> usize {
        self.state.lock().unwrap().pushes.len()
    }

    pub fn pull_count(&self) -> usize {
        self.state.lock().unwrap().pulls
    }

    pub fn last_push(&self) -> Option<Document> {
        self.state.lock().unwrap().pushes.last().cloned()
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.state.lock().unwrap().fail_push = fail;
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.state.lock().unwrap().fail_pull = fail;
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn pull(&self) -> Result<Option<Document>> {
        let mut s = self.state.lock().unwrap();
        s.pulls += 1;
        if s.fail_pull {
            bail!("[MOCK] pull refused");
        }
        Ok(s.document.clone())
    }

    async fn push(&self, doc: &Document) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.fail_push {
            bail!("[MOCK] push refused");
        }
        s.pushes.push(doc.clone());
        s.document = Some(doc.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
