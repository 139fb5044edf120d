//! Session actor: concurrent callers share one owning task

use std::collections::HashSet;

use wms_labels::{
    spawn_session, EngineError, GenerateRequest, InMemoryLabelSink, LabelEngine, LabelSession,
    LabelSink, ParentLabelKind,
};

#[tokio::test]
async fn test_concurrent_generation_is_serialised() {
    let (handle, task) = spawn_session(LabelSession::new(LabelEngine::default()));

    let mut joins = Vec::new();
    for i in 0..8 {
        let handle = handle.clone();
        joins.push(tokio::spawn(async move {
            handle
                .generate(GenerateRequest::new(format!("{}", 1000 + i), 2))
                .await
        }));
    }
    for join in joins {
        assert_eq!(join.await.unwrap().unwrap().len(), 2);
    }

    let (volumes, _) = handle.snapshot().await.unwrap();
    assert_eq!(volumes.len(), 16);

    drop(handle);
    let session = task.await.unwrap();
    assert_eq!(session.volumes().len(), 16);
}

#[tokio::test]
async fn test_confirmation_round_trip_through_handle() {
    let (handle, _task) = spawn_session(LabelSession::new(LabelEngine::default()));
    let sink = InMemoryLabelSink::new();

    let first = handle.generate(GenerateRequest::new("55", 2)).await.unwrap();
    let result = handle.request_print(first[0].id.clone()).await.unwrap();
    sink.submit(&result.outcome().unwrap().job).await.unwrap();

    let second = handle.generate(GenerateRequest::new("55", 1)).await.unwrap();
    let result = handle.request_print(second[0].id.clone()).await.unwrap();
    assert!(result.needs_confirmation());
    assert_eq!(result.existing_volumes_count(), 2);

    let outcome = handle.confirm_print().await.unwrap();
    sink.submit(&outcome.job).await.unwrap();
    assert_eq!(sink.len().await, 2);

    assert_eq!(
        handle.confirm_print().await.unwrap_err(),
        EngineError::NoPendingPrint
    );
}

#[tokio::test]
async fn test_errors_cross_the_channel() {
    let (handle, _task) = spawn_session(LabelSession::new(LabelEngine::default()));

    let err = handle.reprint("NF0-001").await.unwrap_err();
    assert!(matches!(err, EngineError::NothingToReprint { .. }));

    let err = handle
        .link("EM-404", HashSet::from(["x".to_string()]))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ParentLabelNotFound("EM-404".into()));

    let err = handle
        .create_parent_label(Some(" ".into()), "", ParentLabelKind::General, "")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidParentLabelId);
}

#[tokio::test]
async fn test_closed_session() {
    let (handle, task) = spawn_session(LabelSession::new(LabelEngine::default()));
    task.abort();
    let _ = task.await;

    let err = handle
        .generate(GenerateRequest::new("1", 1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionClosed);
}
