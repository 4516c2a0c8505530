//! Scripted in-memory backend for unit tests.

use crate::catalog::{CatalogRow, CatalogSession, Connector};
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared state between a scripted connector, its sessions and the test.
#[derive(Default)]
pub(crate) struct Script {
    responses: Mutex<VecDeque<Result<Vec<CatalogRow>, String>>>,
    executed: Mutex<Vec<(String, Vec<String>)>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl Script {
    pub(crate) fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap_or_default())
            .collect();
        self.responses.lock().unwrap().push_back(Ok(rows));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn executed(&self) -> Vec<(String, Vec<String>)> {
        self.executed.lock().unwrap().clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub(crate) struct ScriptedSession {
    script: Arc<Script>,
}

#[async_trait]
impl CatalogSession for ScriptedSession {
    async fn execute(
        &mut self,
        query: &str,
        params: &[&str],
    ) -> Result<Vec<CatalogRow>, BoxError> {
        self.script.executed.lock().unwrap().push((
            query.to_string(),
            params.iter().map(ToString::to_string).collect(),
        ));
        match self.script.responses.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(message.into()),
            None => Ok(Vec::new()),
        }
    }

    fn is_usable(&self) -> bool {
        true
    }

    async fn close(self) -> Result<(), BoxError> {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct ScriptedConnector {
    script: Arc<Script>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> (Self, Arc<Script>) {
        let script = Arc::new(Script::default());
        (
            Self {
                script: Arc::clone(&script),
            },
            script,
        )
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    fn target(&self) -> String {
        "scripted://test".to_string()
    }

    async fn connect(&self) -> Result<ScriptedSession, BoxError> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            script: Arc::clone(&self.script),
        })
    }
}
