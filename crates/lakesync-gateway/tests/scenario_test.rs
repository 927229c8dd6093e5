//! End-to-end sync scenarios driven through the gateway's public surface.

use std::sync::Arc;

use lakesync_core::config::GatewayConfig;
use lakesync_core::models::hlc::HlcTimestamp;
use lakesync_core::models::protocol::{PullRequest, PushRequest};
use lakesync_core::traits::WallClock;
use lakesync_gateway::Gateway;
use lakesync_rules::SyncRules;
use test_fixtures::{claims, delete, hlc, insert, int, text, update, ManualWallClock};

fn gateway_at(wall_ms: u64) -> (Gateway, Arc<ManualWallClock>) {
    let wall = ManualWallClock::at(wall_ms);
    let gateway = Gateway::with_wall_clock("g1", GatewayConfig::default(), wall.clone());
    (gateway, wall)
}

fn push(client_id: &str, deltas: Vec<lakesync_core::models::delta::RowDelta>) -> PushRequest {
    PushRequest {
        client_id: client_id.into(),
        deltas,
        last_seen_hlc: HlcTimestamp::ZERO,
        deadline_ms: None,
    }
}

fn pull(client_id: &str, since: HlcTimestamp, max: u32) -> PullRequest {
    PullRequest {
        client_id: client_id.into(),
        since_hlc: since,
        max_deltas: max,
        claims: None,
    }
}

/// S1: the later writer wins the column.
#[tokio::test]
async fn s1_lww_later_wins() {
    let (gateway, _wall) = gateway_at(2_500);
    gateway
        .handle_push(push(
            "a",
            vec![update("todos", "r1", "a", hlc(1_000, 0), &[("title", text("A"))])],
        ))
        .await
        .unwrap();
    gateway
        .handle_push(push(
            "b",
            vec![update("todos", "r1", "b", hlc(2_000, 0), &[("title", text("B"))])],
        ))
        .await
        .unwrap();

    assert_eq!(gateway.latest_state("todos", "r1").unwrap()["title"], text("B"));
}

/// S2: concurrent writes to disjoint columns both land.
#[tokio::test]
async fn s2_concurrent_disjoint_columns() {
    let (gateway, _wall) = gateway_at(1_500);
    gateway
        .handle_push(push(
            "a",
            vec![update("todos", "r1", "a", hlc(1_000, 0), &[("title", text("A"))])],
        ))
        .await
        .unwrap();
    gateway
        .handle_push(push(
            "b",
            vec![update("todos", "r1", "b", hlc(1_100, 0), &[("completed", int(1))])],
        ))
        .await
        .unwrap();

    let state = gateway.latest_state("todos", "r1").unwrap();
    assert_eq!(state["title"], text("A"));
    assert_eq!(state["completed"], int(1));
}

/// S3: identical HLCs break the tie toward the lex-greater client id.
#[tokio::test]
async fn s3_tie_break_by_client_id() {
    let (gateway, _wall) = gateway_at(5_500);
    gateway
        .handle_push(push(
            "b",
            vec![update("todos", "r1", "b", hlc(5_000, 0), &[("title", text("from-b"))])],
        ))
        .await
        .unwrap();
    gateway
        .handle_push(push(
            "a",
            vec![update("todos", "r1", "a", hlc(5_000, 0), &[("title", text("from-a"))])],
        ))
        .await
        .unwrap();

    assert_eq!(
        gateway.latest_state("todos", "r1").unwrap()["title"],
        text("from-b")
    );
}

/// S3 extended: DELETE against a concurrent UPDATE at the same HLC also
/// resolves by client id.
#[tokio::test]
async fn s3_extended_delete_vs_update_tie() {
    let (gateway, _wall) = gateway_at(5_500);
    gateway
        .handle_push(push(
            "a",
            vec![update("todos", "r1", "a", hlc(5_000, 0), &[("title", text("a"))])],
        ))
        .await
        .unwrap();
    gateway
        .handle_push(push("b", vec![delete("todos", "r1", "b", hlc(5_000, 0))]))
        .await
        .unwrap();

    // The delete from "b" outranks the update from "a".
    assert!(gateway.latest_state("todos", "r1").is_none());
}

/// S4: re-pushing the same delta is acknowledged but appends nothing.
#[tokio::test]
async fn s4_idempotent_repush() {
    let (gateway, _wall) = gateway_at(1_200);
    let delta = insert("todos", "r1", "a", hlc(1_000, 0), &[("title", text("x"))]);

    gateway.handle_push(push("a", vec![delta.clone()])).await.unwrap();
    let response = gateway.handle_push(push("a", vec![delta])).await.unwrap();
    assert_eq!(response.accepted, 1);

    assert_eq!(gateway.buffer().stats().log_size, 1);
    let page = gateway.handle_pull(pull("b", HlcTimestamp::ZERO, 100)).unwrap();
    assert_eq!(page.deltas.len(), 1);
}

/// S5: a delta too far from the gateway's wall clock rejects the batch and
/// leaves the buffer untouched.
#[tokio::test]
async fn s5_drift_rejection() {
    let (gateway, wall) = gateway_at(100_000);
    let request = push(
        "a",
        vec![update(
            "todos",
            "r1",
            "a",
            hlc(wall.now_ms() + 10_000, 0),
            &[("title", text("future"))],
        )],
    );

    let err = gateway.handle_push(request).await.unwrap_err();
    assert_eq!(err.code(), lakesync_core::errors::ErrorCode::ClockDrift);
    assert_eq!(gateway.buffer().stats().log_size, 0);
}

/// S6: insert, delete, insert again with increasing coordinates ends alive
/// with the last insert's columns.
#[tokio::test]
async fn s6_resurrection() {
    let (gateway, _wall) = gateway_at(400);
    gateway
        .handle_push(push(
            "a",
            vec![
                insert("todos", "r1", "a", hlc(100, 0), &[("title", text("v1")), ("n", int(1))]),
                delete("todos", "r1", "a", hlc(200, 0)),
                insert("todos", "r1", "a", hlc(300, 0), &[("title", text("v3"))]),
            ],
        ))
        .await
        .unwrap();

    let state = gateway.latest_state("todos", "r1").unwrap();
    assert_eq!(state["title"], text("v3"));
    assert!(!state.contains_key("n"), "pre-delete columns stay dead");
}

/// S7: rule-filtered pulls only reveal deltas matching the caller's claims.
#[tokio::test]
async fn s7_filtered_pull() {
    let wall = ManualWallClock::at(1_500);
    let rules = SyncRules::from_json_str(
        r#"{"version":1,"buckets":[{
            "name":"user-todos","tables":["todos"],
            "filters":[{"column":"user_id","op":"eq","value":"jwt:sub"}]
        }]}"#,
    )
    .unwrap();
    let gateway =
        Gateway::with_wall_clock("g1", GatewayConfig::default(), wall).with_rules(rules);

    gateway
        .handle_push(push(
            "a",
            vec![insert(
                "todos",
                "r1",
                "a",
                hlc(1_000, 0),
                &[("user_id", text("a")), ("title", text("mine"))],
            )],
        ))
        .await
        .unwrap();

    let mut foreign = pull("b", HlcTimestamp::ZERO, 100);
    foreign.claims = Some(claims(&[("sub", serde_json::json!("b"))]));
    let response = gateway.handle_pull(foreign).unwrap();
    assert!(response.deltas.is_empty());
    // The cursor still advances: it tracks log position, not visibility.
    assert!(response.next_cursor > HlcTimestamp::ZERO);

    let mut own = pull("a", HlcTimestamp::ZERO, 100);
    own.claims = Some(claims(&[("sub", serde_json::json!("a"))]));
    let response = gateway.handle_pull(own).unwrap();
    assert_eq!(response.deltas.len(), 1);
}

/// S8: 500 deltas paginate out in five full pages, in log order.
#[tokio::test]
async fn s8_paginated_pull() {
    let (gateway, _wall) = gateway_at(2_000);
    for i in 0..500u64 {
        gateway
            .handle_push(push(
                "a",
                vec![update(
                    "todos",
                    &format!("r{i}"),
                    "a",
                    hlc(1_000, i as u16),
                    &[("n", int(i as i64))],
                )],
            ))
            .await
            .unwrap();
    }

    let mut cursor = HlcTimestamp::ZERO;
    let mut collected = Vec::new();
    let mut pages = 0;
    loop {
        let response = gateway.handle_pull(pull("b", cursor, 100)).unwrap();
        pages += 1;
        assert!(response.deltas.len() <= 100);
        collected.extend(response.deltas);
        assert!(response.next_cursor >= cursor);
        cursor = response.next_cursor;
        if !response.has_more {
            break;
        }
        assert_eq!(collected.len() % 100, 0, "full pages until the tail");
    }

    assert_eq!(pages, 5);
    assert_eq!(collected.len(), 500);
    for (i, delta) in collected.iter().enumerate() {
        assert_eq!(delta.columns[0].value, int(i as i64), "log order preserved");
    }

    // P8: pulling from the final cursor yields nothing new.
    let response = gateway.handle_pull(pull("b", cursor, 100)).unwrap();
    assert!(response.deltas.is_empty());
    assert_eq!(response.next_cursor, cursor);
}
