// MetricsStore tests: latest-wins, ring-buffer history, roster, concurrency

mod common;

use infrawatch::store::MetricsStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn store_latest_reflects_most_recent_ingest() {
    let store = MetricsStore::new(10);
    store.ingest(common::sample_snapshot("a1", 100, 10.0)).await;
    store.ingest(common::sample_snapshot("a1", 200, 90.0)).await;

    let latest = store.latest().await;
    assert_eq!(latest.len(), 1);
    assert_eq!(latest["a1"].cpu.usage, 90.0);
    assert_eq!(latest["a1"].timestamp, 200);

    let history = store.history("a1", 10).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].timestamp, 100);
    assert_eq!(history[1].timestamp, 200);
}

#[tokio::test]
async fn store_empty_latest_is_empty_mapping() {
    let store = MetricsStore::new(10);
    assert!(store.latest().await.is_empty());
    assert_eq!(store.agent_count().await, 0);
}

#[tokio::test]
async fn store_history_never_exceeds_cap_and_evicts_oldest() {
    let store = MetricsStore::new(3);
    for ts in 1..=5u64 {
        store.ingest(common::sample_snapshot("a1", ts, 0.0)).await;
    }
    let history = store.history("a1", 10).await;
    assert_eq!(history.len(), 3);
    let timestamps: Vec<u64> = history.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![3, 4, 5]);
}

#[tokio::test]
async fn store_history_limit_truncates_from_tail() {
    let store = MetricsStore::new(10);
    for ts in 1..=6u64 {
        store.ingest(common::sample_snapshot("a1", ts, 0.0)).await;
    }
    let history = store.history("a1", 2).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].timestamp, 5);
    assert_eq!(history[1].timestamp, 6);

    // limit larger than stored returns everything
    let all = store.history("a1", 100).await;
    assert_eq!(all.len(), 6);
}

#[tokio::test]
async fn store_history_unknown_agent_is_empty_not_error() {
    let store = MetricsStore::new(10);
    store.ingest(common::sample_snapshot("a1", 1, 0.0)).await;
    assert!(store.history("unknown", 10).await.is_empty());
}

#[tokio::test]
async fn store_out_of_order_timestamps_keep_arrival_order() {
    let store = MetricsStore::new(10);
    store.ingest(common::sample_snapshot("a1", 200, 1.0)).await;
    store.ingest(common::sample_snapshot("a1", 100, 2.0)).await;

    // Latest is the last accepted ingest, not the max timestamp.
    let latest = store.latest().await;
    assert_eq!(latest["a1"].timestamp, 100);

    let history = store.history("a1", 10).await;
    let timestamps: Vec<u64> = history.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![200, 100]);
}

#[tokio::test]
async fn store_concurrent_ingest_distinct_agents_no_corruption() {
    let store = Arc::new(MetricsStore::new(64));
    let mut handles = Vec::new();
    for agent in ["a1", "a2"] {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for ts in 0..50u64 {
                store
                    .ingest(common::sample_snapshot(agent, ts, ts as f64))
                    .await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    for agent in ["a1", "a2"] {
        let history = store.history(agent, 100).await;
        assert_eq!(history.len(), 50);
        for (i, s) in history.iter().enumerate() {
            assert_eq!(s.agent_id, agent);
            assert_eq!(s.timestamp, i as u64);
        }
    }
}

#[tokio::test]
async fn store_roster_marks_fresh_agents_active() {
    let store = MetricsStore::new(10);
    store.ingest(common::sample_snapshot("a1", 1, 0.0)).await;
    let roster = store.roster(Duration::from_secs(60)).await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, "a1");
    assert_eq!(roster[0].status, "active");
    assert_eq!(roster[0].samples, 1);
    assert_eq!(roster[0].hostname.as_deref(), Some("test-host"));

    // Zero threshold: everything is stale.
    let roster = store.roster(Duration::from_secs(0)).await;
    assert_eq!(roster[0].status, "inactive");
}

#[tokio::test]
async fn store_register_before_first_ingest() {
    let store = MetricsStore::new(10);
    store
        .register("a9", serde_json::json!({"agent_id": "a9", "version": "1.2.0"}))
        .await;

    // Registered agents appear in the roster but not in the latest view.
    assert!(store.latest().await.is_empty());
    let roster = store.roster(Duration::from_secs(60)).await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].samples, 0);
    assert_eq!(
        roster[0].metadata.as_ref().unwrap()["version"],
        "1.2.0"
    );
}

#[tokio::test]
async fn store_summary_tracks_latest_values() {
    let store = MetricsStore::new(10);
    store.ingest(common::sample_snapshot("a1", 100, 10.0)).await;
    store.ingest(common::sample_snapshot("a1", 200, 42.0)).await;
    store.ingest(common::sample_snapshot("a2", 300, 7.0)).await;

    let summary = store.summary().await;
    assert_eq!(summary.len(), 2);
    assert_eq!(summary["a1"].cpu, 42.0);
    assert_eq!(summary["a1"].timestamp, 200);
    assert_eq!(summary["a2"].cpu, 7.0);
    assert_eq!(store.ingest_total().await, 3);
}
