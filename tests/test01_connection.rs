use chrono::{TimeZone, Utc};
use clickhouse_middleware::prelude::*;

fn config() -> ClickhouseConfig {
    ClickhouseConfig::new("localhost:9000")
        .with_database("default")
        .with_debug(true)
}

#[tokio::test]
async fn open_with_pings_and_keeps_config() {
    let conn = Connection::<MockDriver>::open_with(config()).await.unwrap();
    assert_eq!(conn.config().database, "default");
    assert!(conn.is_connected().await);
    assert_eq!(conn.driver().unwrap().calls(), vec!["ping", "ping"]);
}

#[tokio::test]
async fn open_with_rejects_empty_address_before_connecting() {
    let err = Connection::<MockDriver>::open_with(ClickhouseConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn failed_ping_closes_driver() {
    let driver = MockDriver::new(MockScript {
        fail_ping: true,
        ..MockScript::default()
    });
    let err = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(
        err.to_string(),
        "Connection error: ping: Driver error: scripted ping failure"
    );
    assert_eq!(driver.calls(), vec!["ping", "close"]);
    assert!(driver.is_closed());
}

#[tokio::test]
async fn failed_ping_and_failed_close_are_reported_together() {
    let driver = MockDriver::new(MockScript {
        fail_ping: true,
        fail_close: true,
        ..MockScript::default()
    });
    let err = Connection::from_driver(config(), driver).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    let ClickhouseMiddlewareError::Multiple { primary, cleanup } = &err else {
        panic!("expected compound error, got {err}");
    };
    assert_eq!(primary.kind(), ErrorKind::Connection);
    assert_eq!(cleanup.kind(), ErrorKind::Close);
    assert!(err.to_string().starts_with("multiple errors: "));
}

#[tokio::test]
async fn unopened_connection_is_not_connected() {
    let mut conn = Connection::<MockDriver>::unopened(config());
    assert!(!conn.is_connected().await);
    assert!(conn.driver().is_none());

    let err = conn.server_time().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);

    conn.close().await.unwrap();
}

#[tokio::test]
async fn close_is_idempotent() {
    let driver = MockDriver::default();
    let mut conn = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap();

    conn.close().await.unwrap();
    conn.close().await.unwrap();

    assert!(!conn.is_connected().await);
    assert_eq!(driver.calls(), vec!["ping", "close"]);
}

#[tokio::test]
async fn close_failure_is_a_close_error() {
    let driver = MockDriver::default();
    let mut conn = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap();
    driver.set_script(MockScript {
        fail_close: true,
        ..MockScript::default()
    });

    let err = conn.close().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Close);
    // the handle is gone either way
    conn.close().await.unwrap();
}

#[tokio::test]
async fn is_connected_swallows_ping_errors() {
    let driver = MockDriver::default();
    let conn = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap();
    driver.set_script(MockScript {
        fail_ping: true,
        ..MockScript::default()
    });

    assert!(!conn.is_connected().await);
    assert_eq!(conn.ping().await.unwrap_err().kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn server_time_reads_driver_clock() {
    let now = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let driver = MockDriver::new(MockScript {
        now: Some(now),
        ..MockScript::default()
    });
    let conn = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap();

    assert_eq!(conn.server_time().await.unwrap(), now);

    driver.set_script(MockScript {
        fail_server_time: true,
        ..MockScript::default()
    });
    let err = conn.server_time().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
}

#[tokio::test]
async fn execute_passes_statement_through() {
    let driver = MockDriver::default();
    let conn = Connection::from_driver(config(), driver.clone())
        .await
        .unwrap();

    conn.execute("ALTER TABLE t DELETE WHERE id = ?", &[RowValues::Int(4)])
        .await
        .unwrap();
    assert_eq!(
        driver.executed(),
        vec![(
            "ALTER TABLE t DELETE WHERE id = ?".to_string(),
            vec![RowValues::Int(4)]
        )]
    );

    let err = conn.execute("SELECT ?", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parameter);
}
