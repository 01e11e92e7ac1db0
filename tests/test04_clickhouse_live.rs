//! Runs against a real server when `CLICKHOUSE_TEST_ADDR` is set (HTTP interface, e.g.
//! `localhost:8123`); otherwise each test returns early.

use std::env;

use chrono::{Timelike, Utc};
use clickhouse::Row;
use clickhouse_middleware::prelude::*;
use serde::Deserialize;

#[derive(Debug, Row, Deserialize)]
struct Count {
    n: u64,
}

#[derive(Debug, Row, Deserialize)]
struct Session {
    db: String,
    tz: String,
}

fn live_config() -> Option<ClickhouseConfig> {
    let Ok(addr) = env::var("CLICKHOUSE_TEST_ADDR") else {
        eprintln!("CLICKHOUSE_TEST_ADDR not set, skipping live ClickHouse test");
        return None;
    };
    Some(
        ClickhouseConfig::new(addr)
            .with_database("default")
            .with_debug(true),
    )
}

async fn row_count(conn: &Connection, table: &str) -> u64 {
    conn.client()
        .unwrap()
        .query(&format!("SELECT count() AS n FROM {table}"))
        .fetch_one::<Count>()
        .await
        .unwrap()
        .n
}

#[tokio::test]
async fn connects_and_reads_server_time() {
    let Some(config) = live_config() else {
        return;
    };
    let mut conn = Connection::open(config).await.unwrap();

    assert!(conn.is_connected().await);
    let server = conn.server_time().await.unwrap();
    let drift = (Utc::now() - server).num_seconds().abs();
    assert!(drift < 5, "server clock is {drift}s away from wall clock");

    conn.close().await.unwrap();
    conn.close().await.unwrap();
    assert!(!conn.is_connected().await);
}

#[tokio::test]
async fn session_uses_configured_database_and_timezone() {
    let Some(config) = live_config() else {
        return;
    };
    let conn = Connection::open(config.with_database("system").with_zone_info("Asia/Tokyo"))
        .await
        .unwrap();

    let session = conn
        .client()
        .unwrap()
        .query("SELECT currentDatabase() AS db, timezone() AS tz")
        .fetch_one::<Session>()
        .await
        .unwrap();
    assert_eq!(session.db, "system");
    assert_eq!(session.tz, "Asia/Tokyo");
}

#[tokio::test]
async fn unreachable_server_fails_to_open() {
    if live_config().is_none() {
        return;
    }
    let err = Connection::open(ClickhouseConfig::new("127.0.0.1:1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn multi_insert_round_trip() {
    let Some(config) = live_config() else {
        return;
    };
    let conn = Connection::open(config.with_zone_info("UTC")).await.unwrap();
    let table = "clickhouse_middleware_multi_insert";

    conn.execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
        .await
        .unwrap();
    conn.execute(
        &format!(
            "CREATE TABLE {table} (id UInt64, name String, seen DateTime) ENGINE = MergeTree ORDER BY id"
        ),
        &[],
    )
    .await
    .unwrap();

    let insert = format!("INSERT INTO {table} (id, name, seen) VALUES (?,?,?)");

    conn.multi_insert(&insert, &[]).await.unwrap();
    assert_eq!(row_count(&conn, table).await, 0);

    let now = Utc::now().naive_utc();
    let seen = now.with_nanosecond(0).unwrap_or(now);
    let rows: Vec<Vec<RowValues>> = (0..3u64)
        .map(|id| {
            vec![
                RowValues::UInt(id),
                RowValues::Text(format!("it's row {id}?")),
                RowValues::Timestamp(seen),
            ]
        })
        .collect();
    conn.multi_insert(&insert, &rows).await.unwrap();
    assert_eq!(row_count(&conn, table).await, 3);

    let quoted = format!("INSERT INTO {table} (id, name, seen) VALUES (?, 'what?', now())");
    conn.multi_insert(&quoted, &[vec![RowValues::UInt(3)]])
        .await
        .unwrap();
    conn.execute(&quoted, &[RowValues::UInt(4)]).await.unwrap();
    assert_eq!(row_count(&conn, table).await, 5);

    let bad = vec![rows[0].clone(), vec![RowValues::UInt(9)]];
    let err = conn.multi_insert(&insert, &bad).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transaction);
    assert_eq!(row_count(&conn, table).await, 5);

    conn.execute(&format!("DROP TABLE {table}"), &[])
        .await
        .unwrap();
}
