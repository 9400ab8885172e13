use std::collections::HashMap;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use batchrun_core::Value;
use futures::FutureExt;
use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::test_support::{MockConnection, MockConnectionFactory, RecordingReporter, test_config};
use crate::{
    Batch, BatchExecutor, ConnectionLease, MigrationScript, Orchestrator, RunState,
    RunStatus, RunnerError, SilentReporter, split_batches,
};

fn sql_of(batches: &[Batch]) -> Vec<&str> {
    batches.iter().map(Batch::sql).collect()
}

fn orchestrator(factory: &Arc<MockConnectionFactory>) -> Orchestrator {
    Orchestrator::new(factory.clone(), test_config())
}

fn script_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// splitter

#[test]
fn test_split_on_go_lines() {
    let script = indoc! {"
        CREATE TABLE a (id INT)
        GO
        INSERT INTO a VALUES (1)
        go
        SELECT * FROM a
    "};

    let batches = split_batches(script);
    assert_eq!(
        sql_of(&batches),
        vec!["CREATE TABLE a (id INT)", "INSERT INTO a VALUES (1)", "SELECT * FROM a"]
    );
    assert_eq!(
        batches.iter().map(Batch::index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_split_accepts_surrounding_whitespace() {
    let batches = split_batches("SELECT 1\n   Go  \t\nSELECT 2\n\tGO\n");
    assert_eq!(sql_of(&batches), vec!["SELECT 1", "SELECT 2"]);
}

#[test]
fn test_split_handles_crlf() {
    let batches = split_batches("SELECT 1\r\nGO\r\nSELECT 2\r\n");
    assert_eq!(sql_of(&batches), vec!["SELECT 1", "SELECT 2"]);
}

#[test]
fn test_go_must_be_alone_on_its_line() {
    let script = indoc! {"
        SELECT 'GO' AS word
        GO 5
        EXEC sp_go
        GOTO done
        GO;
    "};

    let batches = split_batches(script);
    assert_eq!(batches.len(), 1);
    assert!(batches[0].sql().contains("GO 5"));
    assert!(batches[0].sql().ends_with("GO;"));
}

#[test]
fn test_split_drops_empty_segments() {
    let batches = split_batches("GO\n\nGO\nSELECT 1\nGO\nGO\n\n   \nGO\nSELECT 2\nGO");
    assert_eq!(sql_of(&batches), vec!["SELECT 1", "SELECT 2"]);
    assert_eq!(batches[1].index(), 2);
}

#[test]
fn test_split_without_delimiters_is_one_batch() {
    let batches = split_batches("  SELECT 1;\nSELECT 2;  ");
    assert_eq!(sql_of(&batches), vec!["SELECT 1;\nSELECT 2;"]);
}

#[test]
fn test_split_empty_and_blank_scripts() {
    assert!(split_batches("").is_empty());
    assert!(split_batches("  \n\t\n").is_empty());
    assert!(split_batches("GO\ngo\n  GO  ").is_empty());
}

#[test]
fn test_batch_preview() {
    let batch = Batch::new(1, "UPDATE accounts SET balance = 0\nWHERE id = 1");
    assert_eq!(batch.preview(80), "UPDATE accounts SET balance = 0");
    assert_eq!(batch.preview(6), "UPDATE...");
}

// script loading

#[tokio::test]
async fn test_load_missing_script() {
    let err = MigrationScript::load(Path::new("/nonexistent/migration.sql"))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::ScriptNotFound(_)));
}

#[tokio::test]
async fn test_load_zero_byte_script() {
    let file = script_file("");
    let err = MigrationScript::load(file.path()).await.unwrap_err();
    assert!(matches!(err, RunnerError::EmptyScript(_)));
}

#[tokio::test]
async fn test_load_directory_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MigrationScript::load(dir.path()).await.unwrap_err();
    assert!(matches!(err, RunnerError::ScriptRead { .. }));
}

#[tokio::test]
async fn test_load_whitespace_script() {
    let file = script_file("\n  \n");
    let script = MigrationScript::load(file.path()).await.unwrap();
    assert_eq!(script.text(), "\n  \n");
    assert_eq!(script.path(), file.path());
}

// executor

#[tokio::test]
async fn test_executor_success_returns_rows() {
    let factory = MockConnectionFactory::new();
    let connection = MockConnection::new(factory.state.clone());

    let report = BatchExecutor::new()
        .execute(&connection, &Batch::new(1, "SELECT 1 AS value"))
        .await;

    assert_eq!(report.index, 1);
    let result = report.outcome.result().unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0].values, vec![Value::Int32(1)]);
}

#[tokio::test]
async fn test_executor_failure_keeps_server_message() {
    let factory = MockConnectionFactory::new();
    let connection = MockConnection::new(factory.state.clone());

    let report = BatchExecutor::new()
        .execute(&connection, &Batch::new(2, "DROP TABLE FAIL_me"))
        .await;

    assert!(!report.outcome.is_success());
    assert_eq!(
        report.outcome.error_message(),
        Some("Invalid object name in: DROP TABLE FAIL_me")
    );
}

#[tokio::test]
async fn test_executor_binds_named_parameters() {
    let factory = MockConnectionFactory::new();
    let connection = MockConnection::new(factory.state.clone());

    let mut bindings = HashMap::new();
    bindings.insert("tenant".to_string(), Value::Int64(7));
    bindings.insert("unused".to_string(), Value::Bool(true));

    let report = BatchExecutor::new()
        .with_bindings(bindings)
        .execute(
            &connection,
            &Batch::new(1, "DELETE FROM t WHERE tenant = :tenant OR owner = :tenant"),
        )
        .await;

    assert!(report.outcome.is_success());
    let executed = factory.state.executed.lock().unwrap();
    assert_eq!(
        executed[0],
        (
            "DELETE FROM t WHERE tenant = @P1 OR owner = @P1".to_string(),
            vec![Value::Int64(7)]
        )
    );
}

#[tokio::test]
async fn test_executor_sends_unbound_batches_verbatim() {
    let factory = MockConnectionFactory::new();
    let connection = MockConnection::new(factory.state.clone());
    let executor = BatchExecutor::new();

    let quoted = Batch::new(1, "SELECT 1 AS \"start:time\"");
    let labelled = Batch::new(2, "GOTO done\ndone:PRINT 'x'");

    assert!(executor.execute(&connection, &quoted).await.outcome.is_success());
    assert!(executor.execute(&connection, &labelled).await.outcome.is_success());
    assert_eq!(
        factory.state.executed_sql(),
        vec!["SELECT 1 AS \"start:time\"", "GOTO done\ndone:PRINT 'x'"]
    );
}

#[tokio::test]
async fn test_executor_with_bindings_keeps_labels_and_quoted_identifiers() {
    let factory = MockConnectionFactory::new();
    let connection = MockConnection::new(factory.state.clone());

    let mut bindings = HashMap::new();
    bindings.insert("id".to_string(), Value::Int64(5));

    let report = BatchExecutor::new()
        .with_bindings(bindings)
        .execute(
            &connection,
            &Batch::new(
                1,
                "SELECT \"start:time\" FROM t WHERE id = :id\nGOTO done\ndone:PRINT 'x'",
            ),
        )
        .await;

    assert!(report.outcome.is_success());
    let executed = factory.state.executed.lock().unwrap();
    assert_eq!(
        executed[0],
        (
            "SELECT \"start:time\" FROM t WHERE id = @P1\nGOTO done\ndone:PRINT 'x'".to_string(),
            vec![Value::Int64(5)]
        )
    );
}

// connection lease

#[tokio::test]
async fn test_lease_release_closes_once() {
    let factory = MockConnectionFactory::new();
    let lease = ConnectionLease::acquire(&factory, &test_config())
        .await
        .unwrap();

    assert!(!lease.connection().is_closed());
    lease.release().await;

    assert_eq!(factory.state.connect_count(), 1);
    assert_eq!(factory.state.close_count(), 1);
}

#[tokio::test]
async fn test_lease_acquire_failure() {
    let factory = MockConnectionFactory::refusing();
    let err = ConnectionLease::acquire(&factory, &test_config())
        .await
        .unwrap_err();

    match err {
        RunnerError::Connection { target, .. } => {
            assert_eq!(target, "localhost:1433/migrations")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(factory.state.close_count(), 0);
}

// orchestrator

#[tokio::test]
async fn test_run_all_batches_succeed() {
    let factory = Arc::new(MockConnectionFactory::new());
    let file = script_file("CREATE TABLE t (id INT)\nGO\nINSERT INTO t VALUES (1)\nGO\nSELECT id FROM t\n");
    let mut reporter = RecordingReporter::default();

    let result = orchestrator(&factory)
        .run_path(file.path(), &mut reporter)
        .await;

    assert!(result.is_completed());
    assert_eq!(result.exit_code(), 0);
    assert_eq!((result.total(), result.succeeded(), result.failed()), (3, 3, 0));
    assert_eq!(
        factory.state.executed_sql(),
        vec!["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)", "SELECT id FROM t"]
    );
    assert_eq!(result.reports[2].outcome.result().unwrap().row_count(), 1);
    assert_eq!(factory.state.connect_count(), 1);
    assert_eq!(factory.state.close_count(), 1);
    assert_eq!(
        reporter.states,
        vec![
            RunState::NotStarted,
            RunState::Loaded,
            RunState::Connected,
            RunState::Executing,
            RunState::Finished
        ]
    );
    assert_eq!(reporter.started, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(reporter.runs_finished, 1);
}

#[tokio::test]
async fn test_run_continues_after_failed_batch() {
    let factory = Arc::new(MockConnectionFactory::new());
    let script = MigrationScript::from_text(
        "inline.sql",
        "INSERT INTO a VALUES (1)\nGO\nINSERT INTO FAIL VALUES (2)\nGO\nINSERT INTO c VALUES (3)",
    );
    let mut reporter = RecordingReporter::default();

    let result = orchestrator(&factory)
        .run_script(script, &mut reporter)
        .await;

    assert!(result.is_completed());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.failed(), 1);
    assert_eq!(factory.state.executed_sql().len(), 3);
    assert_eq!(reporter.finished, vec![(1, true), (2, false), (3, true)]);

    let failures: Vec<_> = result.failures().map(|r| r.index).collect();
    assert_eq!(failures, vec![2]);
    assert_eq!(factory.state.close_count(), 1);
}

#[tokio::test]
async fn test_run_every_batch_fails_still_exits_zero() {
    let factory = Arc::new(MockConnectionFactory::new());
    let script = MigrationScript::from_text("inline.sql", "FAIL 1\nGO\nFAIL 2");

    let result = orchestrator(&factory)
        .run_script(script, &mut SilentReporter)
        .await;

    assert_eq!(result.exit_code(), 0);
    assert_eq!((result.succeeded(), result.failed()), (0, 2));
}

#[tokio::test]
async fn test_run_aborts_when_connect_fails() {
    let factory = Arc::new(MockConnectionFactory::refusing());
    let file = script_file("SELECT 1\nGO\nSELECT 2");
    let mut reporter = RecordingReporter::default();

    let result = orchestrator(&factory)
        .run_path(file.path(), &mut reporter)
        .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(
        result.status,
        RunStatus::AbortedBeforeExecution(RunnerError::Connection { .. })
    ));
    assert_eq!(result.total(), 0);
    assert!(factory.state.executed_sql().is_empty());
    assert_eq!(factory.state.close_count(), 0);
    assert!(!reporter.states.contains(&RunState::Executing));
    assert_eq!(reporter.states.last(), Some(&RunState::Finished));
    assert_eq!(reporter.runs_finished, 1);
}

#[tokio::test]
async fn test_run_aborts_on_missing_script_without_connecting() {
    let factory = Arc::new(MockConnectionFactory::new());
    let mut reporter = RecordingReporter::default();

    let result = orchestrator(&factory)
        .run_path(Path::new("/nonexistent/script.sql"), &mut reporter)
        .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(
        result.abort_reason(),
        Some(RunnerError::ScriptNotFound(_))
    ));
    assert_eq!(factory.state.connect_count(), 0);
    assert_eq!(reporter.states, vec![RunState::NotStarted, RunState::Finished]);
}

#[tokio::test]
async fn test_run_aborts_on_empty_script() {
    let factory = Arc::new(MockConnectionFactory::new());
    let file = script_file("");

    let result = orchestrator(&factory)
        .run_path(file.path(), &mut SilentReporter)
        .await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(result.abort_reason(), Some(RunnerError::EmptyScript(_))));
    assert_eq!(factory.state.connect_count(), 0);
}

#[tokio::test]
async fn test_run_with_only_delimiters_completes_with_no_batches() {
    let factory = Arc::new(MockConnectionFactory::new());
    let file = script_file("GO\n\n  go\n");

    let result = orchestrator(&factory)
        .run_path(file.path(), &mut SilentReporter)
        .await;

    assert!(result.is_completed());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.total(), 0);
    assert_eq!(factory.state.connect_count(), 1);
    assert_eq!(factory.state.close_count(), 1);
}

#[tokio::test]
async fn test_run_releases_connection_when_batch_panics() {
    let factory = Arc::new(MockConnectionFactory::new());
    let script = MigrationScript::from_text("inline.sql", "SELECT 1\nGO\nPANIC\nGO\nSELECT 3");
    let runner = orchestrator(&factory);

    let outcome = AssertUnwindSafe(runner.run_script(script, &mut SilentReporter))
        .catch_unwind()
        .await;

    assert!(outcome.is_err());
    assert_eq!(factory.state.executed_sql(), vec!["SELECT 1", "PANIC"]);
    assert_eq!(factory.state.close_count(), 1);
}

#[tokio::test]
async fn test_run_applies_bindings_to_every_batch() {
    let factory = Arc::new(MockConnectionFactory::new());
    let script = MigrationScript::from_text(
        "inline.sql",
        "UPDATE t SET v = :v\nGO\nSELECT * FROM t WHERE v = :v AND w = :other",
    );

    let mut bindings = HashMap::new();
    bindings.insert("v".to_string(), Value::String("x".to_string()));
    let runner = orchestrator(&factory).with_executor(BatchExecutor::new().with_bindings(bindings));

    let result = runner.run_script(script, &mut SilentReporter).await;

    assert_eq!(result.exit_code(), 0);
    assert_eq!((result.succeeded(), result.failed()), (2, 0));
    assert_eq!(
        factory.state.executed_sql(),
        vec![
            "UPDATE t SET v = @P1",
            "SELECT * FROM t WHERE v = @P1 AND w = :other"
        ]
    );
}

#[tokio::test]
async fn test_run_close_failure_keeps_exit_code() {
    let factory = Arc::new(MockConnectionFactory::failing_close());
    let script = MigrationScript::from_text("inline.sql", "SELECT 1\nGO\nINSERT INTO t VALUES (1)");

    let result = orchestrator(&factory)
        .run_script(script, &mut SilentReporter)
        .await;

    assert!(result.is_completed());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.succeeded(), 2);
    assert_eq!(factory.state.close_count(), 1);
}
