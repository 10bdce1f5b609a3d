mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tasklist_core::adapter::BackendKind;
use tasklist_core::blob::{BlobStore, MemoryBlobStore};
use tasklist_core::bridge::{Record, SqlBridge, SqliteBridge};
use tasklist_core::store::{NoticeLevel, StoreStatus};
use tasklist_core::task::{TaskDraft, TaskFilter, TaskPatch, TaskPriority};
use tasklist_core::{Error, Operation};
use tempfile::TempDir;

use common::{store_with, Call, ScriptedBridge};

const TODOS_SCHEMA: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, \
    description TEXT, completed BOOLEAN DEFAULT 0, priority TEXT DEFAULT 'medium', \
    category TEXT, dueDate TEXT, createdAt TEXT NOT NULL, updatedAt TEXT NOT NULL";

#[tokio::test]
async fn fallback_store_persists_across_reload() {
    let blob = MemoryBlobStore::new();
    let store = store_with(None, &blob);
    store.initialize().await.unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Fallback);

    let milk = store
        .add(TaskDraft::new("Buy milk").with_priority(TaskPriority::Low))
        .await
        .unwrap();
    let report = store
        .add(TaskDraft::new("Send report").with_category("Work"))
        .await
        .unwrap();
    let scratch = store.add(TaskDraft::new("Scratch")).await.unwrap();

    store.toggle_complete(milk.id).await.unwrap();
    store
        .update(report.id, TaskPatch::default().priority(TaskPriority::High))
        .await
        .unwrap();
    store.delete(scratch.id).await.unwrap();

    let before = store.tasks().await;

    let reloaded = store_with(None, &blob);
    reloaded.initialize().await.unwrap();
    let after = reloaded.tasks().await;

    assert_eq!(after, before);
    assert_eq!(after.len(), 2);
    let milk = after.iter().find(|t| t.id == milk.id).unwrap();
    assert!(milk.completed);
    let report = after.iter().find(|t| t.id == report.id).unwrap();
    assert_eq!(report.priority, TaskPriority::High);
}

#[tokio::test]
async fn structured_store_round_trips_through_reload() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("todos.db");
    let blob = MemoryBlobStore::new();

    let draft = TaskDraft::new("Renew passport")
        .with_description("Bring two photos")
        .with_category("Personal")
        .with_due_date(NaiveDate::from_ymd_opt(2030, 6, 1).unwrap());

    let added = {
        let bridge: Arc<dyn SqlBridge> = Arc::new(SqliteBridge::open(&db_path).unwrap());
        let store = store_with(Some(bridge), &blob);
        store.initialize().await.unwrap();
        assert_eq!(store.backend_kind(), BackendKind::Structured);
        let added = store.add(draft).await.unwrap();
        store.toggle_complete(added.id).await.unwrap().unwrap()
    };

    // Reopening runs the schema call against an existing table, which fails
    // inside SQLite and must be tolerated
    let bridge: Arc<dyn SqlBridge> = Arc::new(SqliteBridge::open(&db_path).unwrap());
    let store = store_with(Some(bridge), &blob);
    store.initialize().await.unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Structured);

    let tasks = store.tasks().await;
    assert_eq!(tasks, vec![added.clone()]);
    assert!(tasks[0].completed);

    // Nothing went to the fallback slot
    assert!(blob.read().await.unwrap().is_none());
}

#[tokio::test]
async fn load_failure_falls_back_and_stays_there() {
    let bridge = ScriptedBridge::new();
    bridge.fail(Call::Query);
    let blob = MemoryBlobStore::new();

    let store = store_with(Some(Arc::new(bridge.clone())), &blob);
    store.initialize().await.unwrap();
    assert_eq!(store.status().await, StoreStatus::Ready);
    assert_eq!(store.backend_kind(), BackendKind::Fallback);

    // The bridge recovering does not promote the session back
    bridge.recover(Call::Query);
    let task = store.add(TaskDraft::new("Stays local")).await.unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Fallback);
    assert_eq!(task.id, 1);

    let rows = bridge
        .inner()
        .query_data("SELECT * FROM todos", vec![])
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(blob.read().await.unwrap().unwrap().contains("Stays local"));
}

#[tokio::test]
async fn schema_failure_alone_is_tolerated() {
    let bridge = ScriptedBridge::new();
    // Table exists already, then the schema call starts failing
    bridge
        .inner()
        .create_table("todos", TODOS_SCHEMA)
        .await
        .unwrap();
    bridge.fail(Call::CreateTable);

    let store = store_with(Some(Arc::new(bridge)), &MemoryBlobStore::new());
    store.initialize().await.unwrap();
    assert_eq!(store.backend_kind(), BackendKind::Structured);
}

#[tokio::test]
async fn unreadable_row_does_not_abandon_structured_backend() {
    let bridge = ScriptedBridge::new();
    let blob = MemoryBlobStore::new();

    let store = store_with(Some(Arc::new(bridge.clone())), &blob);
    store.initialize().await.unwrap();
    store.add(TaskDraft::new("First")).await.unwrap();
    store.add(TaskDraft::new("Second")).await.unwrap();

    let mut raw = Record::new();
    raw.insert("title".into(), json!("Hand-edited"));
    raw.insert("createdAt".into(), json!("Mon Jan 15 2024"));
    raw.insert("updatedAt".into(), json!("Mon Jan 15 2024"));
    bridge.inner().insert_data("todos", raw).await.unwrap();

    let reloaded = store_with(Some(Arc::new(bridge)), &blob);
    reloaded.initialize().await.unwrap();
    assert_eq!(reloaded.backend_kind(), BackendKind::Structured);

    let mut titles: Vec<_> = reloaded.tasks().await.into_iter().map(|t| t.title).collect();
    titles.sort();
    assert_eq!(titles, vec!["First", "Second"]);
    assert!(blob.read().await.unwrap().is_none());
}

#[tokio::test]
async fn both_backends_failing_is_errored_and_retryable() {
    let bridge = ScriptedBridge::new();
    bridge.fail(Call::Query);
    let blob = MemoryBlobStore::with_contents("definitely not json");

    let store = store_with(Some(Arc::new(bridge)), &blob);
    let mut notices = store.subscribe();

    let result = store.initialize().await;
    assert!(matches!(result, Err(Error::Fallback(_))));
    assert!(matches!(store.status().await, StoreStatus::Errored(_)));
    assert!(matches!(
        store.add(TaskDraft::new("nope")).await,
        Err(Error::NotReady(_))
    ));

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to load tasks");

    // Repair the slot and retry by hand
    blob.write("[]").await.unwrap();
    store.initialize().await.unwrap();
    assert_eq!(store.status().await, StoreStatus::Ready);
    assert_eq!(store.backend_kind(), BackendKind::Fallback);
}

#[tokio::test]
async fn mutation_failure_leaves_memory_untouched() {
    let bridge = ScriptedBridge::new();
    let store = store_with(Some(Arc::new(bridge.clone())), &MemoryBlobStore::new());
    store.initialize().await.unwrap();
    let kept = store.add(TaskDraft::new("Kept")).await.unwrap();
    let mut notices = store.subscribe();

    bridge.fail(Call::Insert);
    bridge.fail(Call::Update);
    bridge.fail(Call::Delete);

    match store.add(TaskDraft::new("Lost")).await {
        Err(Error::Mutation { operation, .. }) => assert_eq!(operation, Operation::Add),
        other => panic!("Expected Mutation error, got: {:?}", other),
    }
    let err = store.toggle_complete(kept.id).await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to update task");
    assert!(store.delete(kept.id).await.is_err());

    assert_eq!(store.tasks().await, vec![kept]);
    // Mutation failures never switch backends
    assert_eq!(store.backend_kind(), BackendKind::Structured);

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to add task");

    bridge.recover(Call::Insert);
    store.add(TaskDraft::new("Works again")).await.unwrap();
    assert_eq!(store.tasks().await.len(), 2);
}

#[tokio::test]
async fn adds_yield_unique_ids_newest_first() {
    let sqlite: Arc<dyn SqlBridge> = Arc::new(SqliteBridge::open_in_memory().unwrap());
    for bridge in [None, Some(sqlite)] {
        let store = store_with(bridge, &MemoryBlobStore::new());
        store.initialize().await.unwrap();

        for i in 0..12 {
            store.add(TaskDraft::new(format!("Task {}", i))).await.unwrap();
        }

        let tasks = store.tasks().await;
        let ids: HashSet<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), tasks.len());
        assert!(tasks
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        assert_eq!(tasks[0].title, "Task 11");
    }
}

#[tokio::test]
async fn partial_update_refreshes_only_updated_at() {
    let store = store_with(
        Some(Arc::new(SqliteBridge::open_in_memory().unwrap())),
        &MemoryBlobStore::new(),
    );
    store.initialize().await.unwrap();

    let original = store
        .add(
            TaskDraft::new("Call plumber")
                .with_description("Kitchen sink")
                .with_category("Personal")
                .with_due_date(NaiveDate::from_ymd_opt(2031, 2, 3).unwrap()),
        )
        .await
        .unwrap();

    let updated = store
        .update(original.id, TaskPatch::default().priority(TaskPriority::High))
        .await
        .unwrap();

    assert_eq!(updated.priority, TaskPriority::High);
    assert_eq!(updated.title, original.title);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.completed, original.completed);
    assert_eq!(updated.category, original.category);
    assert_eq!(updated.due_date, original.due_date);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
}

#[tokio::test]
async fn filtered_view_and_stats_follow_memory() {
    let store = store_with(None, &MemoryBlobStore::new());
    store.initialize().await.unwrap();

    let done = store
        .add(TaskDraft::new("Pay rent").with_priority(TaskPriority::High))
        .await
        .unwrap();
    store
        .add(TaskDraft::new("Buy bread").with_category("Shopping"))
        .await
        .unwrap();
    store.toggle_complete(done.id).await.unwrap();

    let active = store.filtered(TaskFilter::Active, "").await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "Buy bread");
    assert_eq!(store.filtered(TaskFilter::All, "shop").await.len(), 1);

    let stats = store.stats(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()).await;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.completion_rate, 50);
    assert_eq!(stats.high_priority_active, 0);
}
