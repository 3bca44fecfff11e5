//! Integration tests for the full question-answer cycle.

use askdb::llm::CompletionModel;
use askdb::{AskError, CorrectionOutcome, Pipeline, QueryOutcome, Session};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted model: returns canned replies in order and counts calls.
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new<const N: usize>(replies: [Result<&str, &str>; N]) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> askdb::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(AskError::Generation(msg)),
            None => Err(AskError::Generation("script exhausted".to_string())),
        }
    }
}

/// Session over orders(id, user_id, country) and users(id, name).
fn seeded_session() -> Session {
    let session = Session::in_memory().unwrap();
    session
        .connection()
        .execute_batch(
            "CREATE TABLE orders (id INTEGER, user_id INTEGER, country TEXT);
             CREATE TABLE users (id INTEGER, name TEXT);
             INSERT INTO orders VALUES (1, 1, 'India'), (2, 2, 'USA'), (3, 1, 'india');
             INSERT INTO users VALUES (1, 'asha'), (2, 'bob');",
        )
        .unwrap();
    session
}

#[tokio::test]
async fn test_fenced_reply_is_stripped_and_executed() {
    let session = seeded_session();
    let model = ScriptedModel::new([Ok(
        "```sql\nSELECT * FROM orders WHERE country IN ('India', 'IND', 'india');\n```",
    )]);
    let pipeline = Pipeline::new(model).with_region_keywords(vec![]);

    let report = pipeline.ask(&session, "orders from india").await.unwrap();

    assert_eq!(
        report.query,
        "SELECT * FROM orders WHERE country IN ('India', 'IND', 'india');"
    );
    match report.outcome {
        QueryOutcome::Results(table) => assert_eq!(table.rows.len(), 2),
        other => panic!("expected Results, got {:?}", other),
    }
}

#[tokio::test]
async fn test_destructive_statement_is_rejected_without_executing() {
    let session = seeded_session();
    let model = ScriptedModel::new([Ok("DROP TABLE orders;")]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "remove everything").await.unwrap();
    assert!(matches!(report.outcome, QueryOutcome::Rejected));

    // The table must still exist.
    let count: i64 = session
        .connection()
        .query_row("SELECT count(*) FROM orders", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_zero_rows_is_empty_not_failed() {
    let session = seeded_session();
    let model = ScriptedModel::new([Ok("SELECT * FROM orders WHERE country = 'Atlantis'")]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "orders from atlantis").await.unwrap();
    assert!(matches!(report.outcome, QueryOutcome::Empty));
}

#[tokio::test]
async fn test_failed_execution_triggers_exactly_one_correction() {
    let session = seeded_session();
    let model = ScriptedModel::new([
        Ok("SELECT total FROM shipments"),
        Ok("```sql\nSELECT * FROM orders;\n```"),
    ]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "shipment totals").await.unwrap();

    match report.outcome {
        QueryOutcome::Failed { error, correction } => {
            assert!(error.contains("shipments"));
            match correction {
                CorrectionOutcome::Suggested(sql) => assert_eq!(sql, "SELECT * FROM orders;"),
                other => panic!("expected Suggested, got {:?}", other),
            }
        }
        other => panic!("expected Failed, got {:?}", other),
    }

    // One generation call plus exactly one correction call.
    assert_eq!(pipeline_calls(&pipeline), 2);
}

#[tokio::test]
async fn test_failed_correction_is_surfaced() {
    let session = seeded_session();
    let model = ScriptedModel::new([Ok("SELECT total FROM shipments"), Err("model timeout")]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "shipment totals").await.unwrap();
    match report.outcome {
        QueryOutcome::Failed { correction, .. } => {
            assert!(matches!(correction, CorrectionOutcome::Failed(_)));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_region_question_gets_explanation() {
    let session = seeded_session();
    let model = ScriptedModel::new([
        Ok("SELECT * FROM orders WHERE country IN ('India', 'india')"),
        Ok("Matched the common variants of India."),
    ]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "orders from india").await.unwrap();

    assert!(matches!(report.outcome, QueryOutcome::Results(_)));
    assert_eq!(
        report.explanation.as_deref(),
        Some("Matched the common variants of India.")
    );
    assert_eq!(pipeline_calls(&pipeline), 2);
}

#[tokio::test]
async fn test_non_region_question_skips_explanation() {
    let session = seeded_session();
    let model = ScriptedModel::new([Ok("SELECT name FROM users")]);
    let pipeline = Pipeline::new(model).with_region_keywords(vec!["country".to_string()]);

    let report = pipeline.ask(&session, "list all people").await.unwrap();

    assert!(matches!(report.outcome, QueryOutcome::Results(_)));
    assert!(report.explanation.is_none());
    assert_eq!(pipeline_calls(&pipeline), 1);
}

#[tokio::test]
async fn test_explanation_failure_never_affects_results() {
    let session = seeded_session();
    let model = ScriptedModel::new([
        Ok("SELECT * FROM orders WHERE country = 'USA'"),
        Err("model timeout"),
    ]);
    let pipeline = Pipeline::new(model);

    let report = pipeline.ask(&session, "orders by country").await.unwrap();

    match report.outcome {
        QueryOutcome::Results(table) => assert_eq!(table.rows.len(), 1),
        other => panic!("expected Results, got {:?}", other),
    }
    assert!(report.explanation.is_none());
}

#[tokio::test]
async fn test_empty_database_is_terminal() {
    let session = Session::in_memory().unwrap();
    let model = ScriptedModel::new([Ok("SELECT 1")]);
    let pipeline = Pipeline::new(model);

    let result = pipeline.ask(&session, "anything").await;
    assert!(matches!(result, Err(AskError::EmptySource)));
    assert_eq!(pipeline_calls(&pipeline), 0);
}

#[tokio::test]
async fn test_generation_failure_is_surfaced_without_retry() {
    let session = seeded_session();
    let model = ScriptedModel::new([Err("service unavailable")]);
    let pipeline = Pipeline::new(model);

    let result = pipeline.ask(&session, "orders from india").await;
    assert!(matches!(result, Err(AskError::Generation(_))));
    assert_eq!(pipeline_calls(&pipeline), 1);
}

#[test]
fn test_session_opens_a_copy_of_the_upload() {
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("shop.db");

    {
        let conn = rusqlite::Connection::open(&upload).unwrap();
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER, country TEXT);
             INSERT INTO orders VALUES (1, 'India');",
        )
        .unwrap();
    }

    let session = Session::open(&upload).unwrap();
    assert_eq!(session.source_name(), "shop.db");

    let overview = session.overview().unwrap();
    assert_eq!(overview.tables.len(), 1);
    assert_eq!(overview.tables[0].name, "orders");

    // Writes inside the session hit the transient copy, not the upload.
    session
        .connection()
        .execute("INSERT INTO orders VALUES (2, 'USA')", [])
        .unwrap();
    drop(session);

    let conn = rusqlite::Connection::open(&upload).unwrap();
    let count: i64 = conn
        .query_row("SELECT count(*) FROM orders", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

/// Calls made against the pipeline's scripted model.
fn pipeline_calls(pipeline: &Pipeline<ScriptedModel>) -> usize {
    pipeline.model().calls()
}
