//! End-to-end conversation flows through the engine with a scripted
//! oracle: detection, answering, transitions, edits, keep/change
//! disambiguation, and the deterministic path when the oracle is down.

use docfill::document::DocumentText;
use docfill::error::FillError;
use docfill::model::{DocumentStatus, SessionState};
use docfill::Progress;
use uuid::Uuid;

#[path = "helpers/fixtures.rs"]
mod fixtures;

use fixtures::*;

async fn analyzed(engine: &docfill::FillEngine) -> Uuid {
    let record = engine
        .register_document("safe.txt", DocumentText::from_plain_text(SAFE_TEXT))
        .await;
    engine.analyze_document(record.id).await.unwrap();
    record.id
}

#[tokio::test]
async fn test_conversation_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, oracle) = engine_and_oracle(
        vec![
            Ok(detection_json()),
            Ok(clarify_json("Hi! What would you like to do?")),
            Ok(accept_json("Acme Corp")),
            Ok(accept_json("Jane Capital")),
            Ok(accept_json("$50,000.00")),
        ],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();
    assert_eq!(session.state, SessionState::Pending);

    let greeting = engine.process_turn(session.id, "hello").await.unwrap();
    assert_eq!(
        greeting.assistant,
        "Hello! I'll help you fill out this document. Let's start with Company Name. For \
         example: Innovation Labs LLC, Global Systems Corp. What would you like to use?"
    );
    assert_eq!(greeting.progress, Progress { filled: 0, total: 3 });

    let first = engine.process_turn(session.id, "Acme Corp").await.unwrap();
    assert!(first.assistant.contains("I've saved 'Acme Corp' for Company Name"));
    assert!(first.assistant.contains("Now, what about Investor Name?"));
    assert_eq!(first.progress, Progress { filled: 1, total: 3 });
    assert_eq!(
        engine.session(session.id).await.unwrap().state,
        SessionState::InProgress
    );

    let second = engine
        .process_turn(session.id, "Jane Capital")
        .await
        .unwrap();
    assert!(second.assistant.contains("Now, what about Purchase Amount?"));
    assert_eq!(second.progress, Progress { filled: 2, total: 3 });

    let third = engine
        .process_turn(session.id, "$50,000.00")
        .await
        .unwrap();
    assert_eq!(third.progress, Progress { filled: 3, total: 3 });

    let done = engine.session(session.id).await.unwrap();
    assert_eq!(done.state, SessionState::Completed);
    assert!(done.completed_at.is_some());

    // Post-completion turns answer deterministically, no oracle round.
    let after = engine.process_turn(session.id, "thanks").await.unwrap();
    assert!(after
        .assistant
        .starts_with("Excellent! All placeholders have been filled."));
    assert_eq!(oracle.calls(), 5);
}

#[tokio::test]
async fn test_value_echoing_field_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![Ok(detection_json()), Ok(accept_json("company name"))],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();

    let reply = engine
        .process_turn(session.id, "company name")
        .await
        .unwrap();
    assert!(reply.assistant.starts_with("I need a value for company name."));
    assert_eq!(reply.progress, Progress { filled: 0, total: 3 });
}

#[tokio::test]
async fn test_keep_confirmation_after_completion() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, oracle) = engine_and_oracle(
        vec![
            Ok(detection_json()),
            Ok(accept_json("Acme Corp")),
            Ok(accept_json("Jane Capital")),
            Ok(accept_json("$50,000.00")),
        ],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();
    for answer in ["Acme Corp", "Jane Capital", "$50,000.00"] {
        engine.process_turn(session.id, answer).await.unwrap();
    }

    let revisit = engine
        .process_turn(session.id, "investor name")
        .await
        .unwrap();
    assert_eq!(
        revisit.assistant,
        "I already have 'Jane Capital' for Investor Name. Would you like to keep this \
         value, or change it? For example: TechStart Inc., Jane Doe, Esq.."
    );
    // Keep-or-change puts an edit on the table, so the session reopens
    // until the user settles it.
    assert_eq!(
        engine.session(session.id).await.unwrap().state,
        SessionState::InProgress
    );

    let keep = engine
        .process_turn(session.id, "keep the investor name")
        .await
        .unwrap();
    assert_eq!(
        keep.assistant,
        "Perfect! I'll keep 'Jane Capital'. All placeholders have been filled. You can now \
         render and download the completed document."
    );
    assert_eq!(keep.progress, Progress { filled: 3, total: 3 });
    assert_eq!(
        engine.session(session.id).await.unwrap().state,
        SessionState::Completed
    );
    assert_eq!(oracle.calls(), 4);
}

#[tokio::test]
async fn test_edit_after_completion_updates_value() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![
            Ok(detection_json()),
            Ok(accept_json("Acme Corp")),
            Ok(accept_json("Jane Capital")),
            Ok(accept_json("$50,000.00")),
            Ok(accept_for("Jane Ventures LLC", "investor name")),
        ],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();
    for answer in ["Acme Corp", "Jane Capital", "$50,000.00"] {
        engine.process_turn(session.id, answer).await.unwrap();
    }

    let edit = engine
        .process_turn(session.id, "change the investor name to Jane Ventures LLC")
        .await
        .unwrap();
    assert_eq!(
        edit.assistant,
        "Perfect! I've saved 'Jane Ventures LLC' for Investor Name."
    );
    assert_eq!(edit.progress, Progress { filled: 3, total: 3 });

    let html = engine.live_preview(doc_id, session.id).await.unwrap();
    assert!(html.contains("Jane Ventures LLC"));
    assert!(!html.contains("Jane Capital"));
}

#[tokio::test]
async fn test_edit_request_after_completion_reopens_session() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![
            Ok(detection_json()),
            Ok(accept_json("Acme Corp")),
            Ok(accept_json("Jane Capital")),
            Ok(accept_json("$50,000.00")),
            Ok(edit_json("company_name", "")),
            Ok(accept_for("Acme Holdings Inc.", "company name")),
        ],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();
    for answer in ["Acme Corp", "Jane Capital", "$50,000.00"] {
        engine.process_turn(session.id, answer).await.unwrap();
    }
    assert_eq!(
        engine.session(session.id).await.unwrap().state,
        SessionState::Completed
    );

    // An edit request that is still waiting for the new value holds the
    // session open even though every field has an answer.
    let ask = engine
        .process_turn(session.id, "change the company name")
        .await
        .unwrap();
    assert_eq!(
        ask.assistant,
        "I see you want to edit company_name (currently: 'Acme Corp'). What should the new \
         value be? For example: Innovation Labs LLC, Global Systems Corp."
    );
    assert_eq!(ask.progress, Progress { filled: 3, total: 3 });
    let reopened = engine.session(session.id).await.unwrap();
    assert_eq!(reopened.state, SessionState::InProgress);
    assert!(reopened.completed_at.is_none());

    let commit = engine
        .process_turn(session.id, "change the company name to Acme Holdings Inc.")
        .await
        .unwrap();
    assert_eq!(
        commit.assistant,
        "Perfect! I've saved 'Acme Holdings Inc.' for Company Name."
    );
    let done = engine.session(session.id).await.unwrap();
    assert_eq!(done.state, SessionState::Completed);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn test_pending_edit_recovered_by_named_target() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![
            Ok(detection_json()),
            Ok(accept_json("Acme Corp")),
            Ok(accept_json("Jane Capital")),
            Ok(edit_json("company_name", "What should the new value be?")),
            Ok(accept_for("Beta Industries", "company_name")),
        ],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();
    engine.process_turn(session.id, "Acme Corp").await.unwrap();
    engine
        .process_turn(session.id, "Jane Capital")
        .await
        .unwrap();

    let ask = engine
        .process_turn(session.id, "change the company name")
        .await
        .unwrap();
    assert_eq!(
        ask.assistant,
        "I see you want to edit company_name. What should the new value be?"
    );
    assert_eq!(ask.progress, Progress { filled: 2, total: 3 });

    // The bare value lands on the named target, not the next blank.
    let commit = engine
        .process_turn(session.id, "Beta Industries")
        .await
        .unwrap();
    assert_eq!(
        commit.assistant,
        "Perfect! I've saved 'Beta Industries' for Company Name."
    );
    assert_eq!(commit.progress, Progress { filled: 2, total: 3 });

    let html = engine.live_preview(doc_id, session.id).await.unwrap();
    assert!(html.contains("Beta Industries"));
    assert!(!html.contains("Acme Corp"));
}

#[tokio::test]
async fn test_oracle_down_keeps_conversation_moving() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![Ok(detection_json()), Err(()), Err(())],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let session = engine.create_session(doc_id).await.unwrap();

    let question = engine
        .process_turn(session.id, "what is a purchase amount?")
        .await
        .unwrap();
    assert!(question.assistant.starts_with("I need more clarity. For company name"));
    assert_eq!(question.progress, Progress { filled: 0, total: 3 });

    let answer = engine
        .process_turn(session.id, "Acme Corporation")
        .await
        .unwrap();
    assert!(answer.assistant.contains("I've saved 'Acme Corporation'"));
    assert!(answer.assistant.contains("Now, what about Investor Name?"));
    assert_eq!(answer.progress, Progress { filled: 1, total: 3 });
}

#[tokio::test]
async fn test_sessions_do_not_share_answers() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(
        vec![Ok(detection_json()), Ok(accept_json("Acme Corp"))],
        dir.path(),
    );
    let doc_id = analyzed(&engine).await;
    let first = engine.create_session(doc_id).await.unwrap();
    let second = engine.create_session(doc_id).await.unwrap();

    let reply = engine.process_turn(first.id, "Acme Corp").await.unwrap();
    assert_eq!(reply.progress, Progress { filled: 1, total: 3 });

    assert_eq!(
        engine.session(second.id).await.unwrap().state,
        SessionState::Pending
    );
    assert!(matches!(
        engine.render(doc_id, second.id).await,
        Err(FillError::NoAnswers(_))
    ));

    engine.render(doc_id, first.id).await.unwrap();
    assert_eq!(
        engine.document(doc_id).await.unwrap().status,
        DocumentStatus::Filled
    );
}
