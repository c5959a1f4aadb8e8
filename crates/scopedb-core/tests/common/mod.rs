#![allow(dead_code)]

use async_trait::async_trait;
use scopedb_core::{
    AsyncResource, AsyncRowCursor, Cancelled, IsCancelled, Resource, RowCursor,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Route engine traces to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Recognisable errors for the operations under test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("primary failed: {0}")]
    Primary(&'static str),
    #[error("recovery failed: {0}")]
    Recovery(&'static str),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl IsCancelled for OpError {
    fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[derive(Debug, Error)]
#[error("stub {0} failure")]
pub struct StubError(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Commit,
    Rollback,
    Close,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub calls: Vec<Call>,
}

/// Resource stub that records every transaction-control call.
pub struct CountingResource {
    ledger: Arc<Mutex<Ledger>>,
    transactional: bool,
    fail_commit: bool,
    fail_rollback: bool,
    fail_close: bool,
}

#[derive(Clone)]
pub struct Probe(Arc<Mutex<Ledger>>);

impl Probe {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }
}

impl CountingResource {
    pub fn new(transactional: bool) -> (Self, Probe) {
        let ledger = Arc::new(Mutex::new(Ledger::default()));
        (
            Self {
                ledger: ledger.clone(),
                transactional,
                fail_commit: false,
                fail_rollback: false,
                fail_close: false,
            },
            Probe(ledger),
        )
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    fn record(&self, call: Call) {
        self.ledger.lock().unwrap().calls.push(call);
    }

    fn do_commit(&mut self) -> Result<(), StubError> {
        self.record(Call::Commit);
        if self.fail_commit {
            return Err(StubError("commit"));
        }
        self.transactional = false;
        Ok(())
    }

    fn do_rollback(&mut self) -> Result<(), StubError> {
        self.record(Call::Rollback);
        if self.fail_rollback {
            return Err(StubError("rollback"));
        }
        self.transactional = false;
        Ok(())
    }

    fn do_close(&self) -> Result<(), StubError> {
        self.record(Call::Close);
        if self.fail_close {
            return Err(StubError("close"));
        }
        Ok(())
    }
}

impl Resource for CountingResource {
    type Error = StubError;

    fn is_transactional(&self) -> bool {
        self.transactional
    }

    fn commit(&mut self) -> Result<(), StubError> {
        self.do_commit()
    }

    fn rollback(&mut self) -> Result<(), StubError> {
        self.do_rollback()
    }

    fn close(self) -> Result<(), StubError> {
        self.do_close()
    }
}

#[async_trait]
impl AsyncResource for CountingResource {
    type Error = StubError;

    fn is_transactional(&self) -> bool {
        self.transactional
    }

    async fn commit(&mut self) -> Result<(), StubError> {
        tokio::task::yield_now().await;
        self.do_commit()
    }

    async fn rollback(&mut self) -> Result<(), StubError> {
        tokio::task::yield_now().await;
        self.do_rollback()
    }

    async fn close(self) -> Result<(), StubError> {
        tokio::task::yield_now().await;
        self.do_close()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no current row")]
pub struct NoCurrentRow;

/// In-memory row of optional booleans. `row: None` models a cursor that is
/// not positioned on a row.
pub struct BoolRow {
    pub row: Option<Vec<Option<bool>>>,
    pub null_check_delay: Option<Duration>,
    pub read_delay: Option<Duration>,
}

impl BoolRow {
    pub fn new(values: Vec<Option<bool>>) -> Self {
        Self {
            row: Some(values),
            null_check_delay: None,
            read_delay: None,
        }
    }

    pub fn unpositioned() -> Self {
        Self {
            row: None,
            null_check_delay: None,
            read_delay: None,
        }
    }

    pub fn slow_null_check(mut self, delay: Duration) -> Self {
        self.null_check_delay = Some(delay);
        self
    }

    pub fn slow_read(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn get_bool(&self, index: usize) -> Result<bool, NoCurrentRow> {
        let row = self.row.as_ref().ok_or(NoCurrentRow)?;
        Ok(row[index].unwrap_or_default())
    }

    pub async fn get_bool_async(&self, index: usize) -> Result<bool, NoCurrentRow> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.get_bool(index)
    }
}

impl RowCursor for BoolRow {
    type Error = NoCurrentRow;

    fn field_count(&self) -> Result<usize, NoCurrentRow> {
        self.row.as_ref().map(Vec::len).ok_or(NoCurrentRow)
    }

    fn is_absent_at(&self, index: usize) -> Result<bool, NoCurrentRow> {
        let row = self.row.as_ref().ok_or(NoCurrentRow)?;
        Ok(row[index].is_none())
    }
}

#[async_trait]
impl AsyncRowCursor for BoolRow {
    type Error = NoCurrentRow;

    fn field_count(&self) -> Result<usize, NoCurrentRow> {
        RowCursor::field_count(self)
    }

    async fn is_absent_at(&self, index: usize) -> Result<bool, NoCurrentRow> {
        if let Some(delay) = self.null_check_delay {
            tokio::time::sleep(delay).await;
        }
        RowCursor::is_absent_at(self, index)
    }
}
