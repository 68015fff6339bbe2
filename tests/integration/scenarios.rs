//! End-to-end runs against a mocked cluster API and mocked report endpoints
//!
//! The cluster and the reporters live on separate mock servers so the cluster
//! can be re-scripted between runs without losing recorded reports.

use chrono::{TimeDelta, Utc};
use complainer::error::{DispatchError, MonitorError};
use complainer::monitor::Decision;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_first_run_reports_nothing() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    let labels = route_labels(&reports, "slack", &["team-a"]);
    mount_cluster(
        &cluster,
        vec![
            failure_json("task-1", now, &labels),
            failure_json("task-2", now, &labels),
        ],
    )
    .await;

    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    let report = monitor.run_once_at(now).await.unwrap();

    assert!(report.first_run);
    assert!(report.accepted.is_empty());
    assert!(monitor.recent().contains("task-1"));
    assert!(monitor.recent().contains("task-2"));
    assert!(posts_to(&reports, "/").await.is_empty());

    // Nothing new ten seconds later
    let report = monitor
        .run_once_at(now + TimeDelta::seconds(10))
        .await
        .unwrap();

    assert!(report.accepted.is_empty());
    assert!(
        report
            .skipped
            .iter()
            .all(|(_, decision)| *decision == Decision::Duplicate)
    );
    assert!(posts_to(&reports, "/").await.is_empty());
}

#[tokio::test]
async fn test_new_failure_fans_out_to_configured_reporters() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack", "email"]);
    monitor.run_once_at(now).await.unwrap();

    cluster.reset().await;
    mount_cluster(
        &cluster,
        vec![failure_json(
            "task-1",
            now,
            &route_labels(&reports, "slack", &["team-a"]),
        )],
    )
    .await;

    let report = monitor.run_once_at(now).await.unwrap();

    assert_eq!(report.accepted, vec!["task-1".to_string()]);
    assert_eq!(report.delivered, 1);

    let slack = posts_to(&reports, "/slack/team-a").await;
    assert_eq!(slack.len(), 1);
    assert_eq!(slack[0]["id"], "task-1");
    assert_eq!(slack[0]["instance"], "team-a");
    assert_eq!(slack[0]["stdout"], "http://agent/task-1/stdout");
    assert!(posts_to(&reports, "/email").await.is_empty());
}

#[tokio::test]
async fn test_failure_id_with_reserved_characters_is_reported() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    monitor.run_once_at(now).await.unwrap();

    cluster.reset().await;
    mount_cluster(
        &cluster,
        vec![failure_json(
            "task#1",
            now,
            &route_labels(&reports, "slack", &["team-a"]),
        )],
    )
    .await;

    let report = monitor.run_once_at(now).await.unwrap();

    assert!(report.dispatch_failures.is_empty());
    assert_eq!(report.accepted, vec!["task#1".to_string()]);

    let slack = posts_to(&reports, "/slack/team-a").await;
    assert_eq!(slack.len(), 1);
    assert_eq!(slack[0]["id"], "task#1");
    assert_eq!(slack[0]["stdout"], "http://agent/task%231/stdout");
}

#[tokio::test]
async fn test_stale_failure_is_skipped() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    monitor.run_once_at(now).await.unwrap();

    let labels = route_labels(&reports, "slack", &["team-a"]);
    cluster.reset().await;
    mount_cluster(
        &cluster,
        vec![
            failure_json("stale", now - TimeDelta::seconds(50), &labels),
            failure_json("fresh", now - TimeDelta::seconds(10), &labels),
        ],
    )
    .await;

    let report = monitor.run_once_at(now).await.unwrap();

    assert_eq!(report.accepted, vec!["fresh".to_string()]);
    assert_eq!(report.skipped, vec![("stale".to_string(), Decision::Stale)]);

    let posts = posts_to(&reports, "/slack").await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], "fresh");
}

#[tokio::test]
async fn test_missing_logs_for_one_failure() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    monitor.run_once_at(now).await.unwrap();

    let labels = route_labels(&reports, "slack", &["team-a"]);
    cluster.reset().await;
    Mock::given(method("GET"))
        .and(path("/failures/task-2/logs"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&cluster)
        .await;
    mount_cluster(
        &cluster,
        vec![
            failure_json("task-1", now, &labels),
            failure_json("task-2", now, &labels),
            failure_json("task-3", now, &labels),
        ],
    )
    .await;

    let report = monitor.run_once_at(now).await.unwrap();

    assert_eq!(report.accepted.len(), 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.dispatch_failures.len(), 1);
    assert_eq!(report.dispatch_failures[0].failure_id, "task-2");
    assert!(matches!(
        report.dispatch_failures[0].error,
        DispatchError::Logs(_)
    ));
    assert!(monitor.recent().contains("task-2"));

    let ids: Vec<String> = posts_to(&reports, "/slack")
        .await
        .iter()
        .map(|post| post["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["task-1", "task-3"]);
}

#[tokio::test]
async fn test_failing_reporter_isolated() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &["/slack"]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack", "email"]);
    monitor.run_once_at(now).await.unwrap();

    let mut labels = route_labels(&reports, "slack", &["team-a"]);
    labels.extend(route_labels(&reports, "email", &["oncall"]));
    cluster.reset().await;
    mount_cluster(&cluster, vec![failure_json("task-1", now, &labels)]).await;

    let report = monitor.run_once_at(now).await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.delivery_failures.len(), 1);
    assert_eq!(report.delivery_failures[0].reporter, "slack");
    assert_eq!(report.delivery_failures[0].instance, "team-a");
    assert_eq!(report.delivery_failures[0].failure_id, "task-1");
    assert_eq!(posts_to(&reports, "/email/oncall").await.len(), 1);

    // Not retried, the ID is still cached
    let report = monitor
        .run_once_at(now + TimeDelta::seconds(5))
        .await
        .unwrap();
    assert!(report.accepted.is_empty());
    assert_eq!(posts_to(&reports, "/slack").await.len(), 1);
}

#[tokio::test]
async fn test_cluster_down_aborts_run() {
    let cluster = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/failures"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&cluster)
        .await;

    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    let result = monitor.run_once().await;

    assert!(matches!(result, Err(MonitorError::Poll(_))));
    assert!(monitor.recent().is_empty());
}

#[tokio::test]
async fn test_expired_entries_evicted() {
    let cluster = MockServer::start().await;
    let reports = MockServer::start().await;
    mount_reporters(&reports, &[]).await;

    let now = Utc::now();
    mount_cluster(&cluster, vec![failure_json("task-1", now, &[])]).await;
    let mut monitor = create_test_monitor(&cluster, &["slack"]);
    monitor.run_once_at(now).await.unwrap();
    assert!(monitor.recent().contains("task-1"));

    cluster.reset().await;
    mount_cluster(&cluster, vec![]).await;

    let report = monitor
        .run_once_at(now + TimeDelta::seconds(59))
        .await
        .unwrap();
    assert_eq!(report.evicted, 0);

    let report = monitor
        .run_once_at(now + TimeDelta::seconds(60))
        .await
        .unwrap();
    assert_eq!(report.evicted, 1);
    assert!(monitor.recent().is_empty());
}
