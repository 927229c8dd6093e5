//! Gateway admission contracts: state machine, deadline, quota, and
//! backpressure.

use std::sync::Arc;

use async_trait::async_trait;

use lakesync_core::config::GatewayConfig;
use lakesync_core::errors::ErrorCode;
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::protocol::{PullRequest, PushRequest};
use lakesync_core::traits::quota::{QuotaChecker, QuotaDecision};
use lakesync_gateway::{Gateway, GatewayState};
use test_fixtures::{hlc, text, update, ManualWallClock};

fn push_one(row: &str, at_ms: u64) -> PushRequest {
    PushRequest {
        client_id: "c".into(),
        deltas: vec![update("t", row, "c", hlc(at_ms, 0), &[("x", text("v"))])],
        last_seen_hlc: HlcTimestamp::ZERO,
        deadline_ms: None,
    }
}

fn pull_all() -> PullRequest {
    PullRequest {
        client_id: "c".into(),
        since_hlc: HlcTimestamp::ZERO,
        max_deltas: 100,
        claims: None,
    }
}

#[tokio::test]
async fn suspended_rejects_push_but_serves_pull() {
    let wall = ManualWallClock::at(1_000);
    let gateway = Gateway::with_wall_clock("g1", GatewayConfig::default(), wall);
    gateway.handle_push(push_one("r1", 1_000)).await.unwrap();

    gateway.suspend();
    assert_eq!(gateway.state(), GatewayState::Suspended);

    let err = gateway.handle_push(push_one("r2", 1_000)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::QuotaExceeded);
    assert!(err.retry_after_ms().is_some());

    let page = gateway.handle_pull(pull_all()).unwrap();
    assert_eq!(page.deltas.len(), 1);

    gateway.resume();
    assert_eq!(gateway.state(), GatewayState::Active);
    gateway.handle_push(push_one("r2", 1_000)).await.unwrap();
}

#[tokio::test]
async fn deleted_rejects_everything() {
    let wall = ManualWallClock::at(1_000);
    let gateway = Gateway::with_wall_clock("g1", GatewayConfig::default(), wall);
    gateway.mark_deleted();

    assert!(gateway.handle_push(push_one("r1", 1_000)).await.is_err());
    assert!(gateway.handle_pull(pull_all()).is_err());

    // Terminal: resume does not leave Deleted.
    gateway.resume();
    assert_eq!(gateway.state(), GatewayState::Deleted);
}

#[tokio::test]
async fn expired_deadline_rejects_before_mutation() {
    let wall = ManualWallClock::at(10_000);
    let gateway = Gateway::with_wall_clock("g1", GatewayConfig::default(), wall);

    let mut request = push_one("r1", 10_000);
    request.deadline_ms = Some(9_000);
    let err = gateway.handle_push(request).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::DeadlineExceeded);
    assert_eq!(gateway.buffer().stats().log_size, 0);
}

struct DenyAll;

#[async_trait]
impl QuotaChecker for DenyAll {
    async fn check_push(&self, _: &str, _: usize, _: u64) -> QuotaDecision {
        QuotaDecision::Denied {
            reason: "plan limit reached".into(),
            retry_after_ms: Some(30_000),
        }
    }
}

#[tokio::test]
async fn quota_denial_short_circuits_without_touching_state() {
    let wall = ManualWallClock::at(1_000);
    let gateway =
        Gateway::with_wall_clock("g1", GatewayConfig::default(), wall).with_quota(Arc::new(DenyAll));

    let before = gateway.clock().last_seen();
    let err = gateway.handle_push(push_one("r1", 1_000)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::QuotaExceeded);
    assert_eq!(err.retry_after_ms(), Some(30_000));
    assert_eq!(gateway.buffer().stats().log_size, 0);
    assert_eq!(gateway.clock().last_seen(), before, "HLC untouched");
}

#[tokio::test]
async fn pressure_hint_appears_past_the_threshold() {
    let wall = ManualWallClock::at(1_000);
    let config = GatewayConfig {
        max_buffer_bytes: 400,
        ..GatewayConfig::default()
    };
    let gateway = Gateway::with_wall_clock("g1", config, wall);

    let first = gateway.handle_push(push_one("r1", 1_000)).await.unwrap();
    assert!(first.buffer_pressure.is_none());

    let mut last_pressure = None;
    for i in 2..=4 {
        let response = gateway
            .handle_push(push_one(&format!("r{i}"), 1_000))
            .await
            .unwrap();
        last_pressure = response.buffer_pressure;
    }
    let pressure = last_pressure.expect("hint expected near the bound");
    assert!(pressure >= 0.8);
}

#[tokio::test]
async fn full_buffer_rejects_with_retry_hint() {
    let wall = ManualWallClock::at(1_000);
    let config = GatewayConfig {
        max_buffer_bytes: 100,
        ..GatewayConfig::default()
    };
    let gateway = Gateway::with_wall_clock("g1", config, wall);

    gateway.handle_push(push_one("r1", 1_000)).await.unwrap();
    gateway.handle_push(push_one("r2", 1_000)).await.unwrap();
    let err = gateway.handle_push(push_one("r3", 1_000)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BufferFull);
    assert!(err.retry_after_ms().is_some());
}
