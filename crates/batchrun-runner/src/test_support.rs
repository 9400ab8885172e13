//! Mock connections and reporters shared by the runner tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use batchrun_core::{
    BatchrunError, ColumnMeta, Connection, ConnectionConfig, ConnectionFactory, QueryResult,
    Result, Row, Value,
};

use crate::executor::BatchReport;
use crate::orchestrator::{RunResult, RunState};
use crate::report::RunReporter;
use crate::splitter::Batch;

/// Everything the mock driver observed, shared between factory and connection
#[derive(Default)]
pub struct MockState {
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockState {
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Mock connection.
///
/// A batch containing `FAIL` returns a query error, one containing `PANIC`
/// panics, and one starting with `SELECT` returns a single-row result. A
/// connection built with `fail_close` counts the close call and then errors.
pub struct MockConnection {
    state: Arc<MockState>,
    closed: AtomicBool,
    fail_close: bool,
}

impl MockConnection {
    pub fn new(state: Arc<MockState>) -> Self {
        Self {
            state,
            closed: AtomicBool::new(false),
            fail_close: false,
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.state
            .executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        if sql.contains("PANIC") {
            panic!("mock driver panic");
        }
        if sql.contains("FAIL") {
            return Err(BatchrunError::Query(format!("Invalid object name in: {}", sql)));
        }
        if sql.starts_with("SELECT") {
            return Ok(single_row_result());
        }
        Ok(QueryResult::empty())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(BatchrunError::Connection("connection reset during logout".into()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn single_row_result() -> QueryResult {
    let mut result = QueryResult::empty();
    result.columns = vec![ColumnMeta {
        name: "value".to_string(),
        data_type: "int".to_string(),
        ordinal: 0,
    }];
    result.rows = vec![Row::new(vec![Value::Int32(1)])];
    result
}

/// Factory handing out `MockConnection`s, or refusing to connect
pub struct MockConnectionFactory {
    pub state: Arc<MockState>,
    refuse: bool,
    fail_close: bool,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            refuse: false,
            fail_close: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new()
        }
    }

    pub fn failing_close() -> Self {
        Self {
            fail_close: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(BatchrunError::Connection("connection refused".into()));
        }
        let mut connection = MockConnection::new(Arc::clone(&self.state));
        connection.fail_close = self.fail_close;
        Ok(Box::new(connection))
    }
}

pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", "migrations", "sa", "secret")
}

/// Reporter recording every callback in order
#[derive(Default)]
pub struct RecordingReporter {
    pub states: Vec<RunState>,
    pub started: Vec<(usize, usize)>,
    pub finished: Vec<(usize, bool)>,
    pub runs_finished: usize,
}

impl RunReporter for RecordingReporter {
    fn state_changed(&mut self, state: RunState) {
        self.states.push(state);
    }

    fn batch_started(&mut self, batch: &Batch, total: usize) {
        self.started.push((batch.index(), total));
    }

    fn batch_finished(&mut self, report: &BatchReport, _total: usize) {
        self.finished.push((report.index, report.outcome.is_success()));
    }

    fn run_finished(&mut self, _result: &RunResult) {
        self.runs_finished += 1;
    }
}
