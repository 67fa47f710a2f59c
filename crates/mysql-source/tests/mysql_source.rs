//! Integration tests for the MySQL table source
//!
//! These need Docker and are ignored by default:
//! `cargo test -p base-sync-mysql-source -- --ignored`

use anyhow::Result;
use base_sync_mysql_source::{testing::MySQLContainer, MySqlSource};
use mysql_async::prelude::*;
use sync_core::{SourceValue, TableSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TEST_PORT: u16 = 13310;

fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_reads_schema_and_pages_in_key_order() -> Result<()> {
    init_logging();

    let container = MySQLContainer::new("base-sync-mysql-source", TEST_PORT);
    container.start()?;
    container.wait_until_ready(90).await?;

    let mut conn = container.connect().await?;
    conn.query_drop(
        "CREATE TABLE users (
            id INT PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            active TINYINT(1),
            created DATETIME,
            born DATE,
            payload BLOB
        )",
    )
    .await?;
    conn.query_drop("CREATE TABLE logs (message TEXT)").await?;
    conn.query_drop(
        "INSERT INTO users VALUES
            (3, 'C', 0, NULL, NULL, NULL),
            (1, 'A', 1, '2024-01-01 00:00:01', '2024-01-02', 'ab'),
            (2, 'B', NULL, NULL, NULL, NULL)",
    )
    .await?;
    conn.disconnect().await?;

    let mut source = MySqlSource::connect(&container.source_opts()).await?;

    let tables = source.list_tables().await?;
    assert_eq!(tables, vec!["logs".to_string(), "users".to_string()]);

    let columns = source.describe_table("users").await?;
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["id", "name", "active", "created", "born", "payload"]);
    assert!(columns[0].is_key);
    assert!(!columns[1].nullable);
    assert_eq!(columns[2].raw_type, "tinyint(1)");

    assert_eq!(source.primary_key("users").await?, Some("id".to_string()));
    assert_eq!(source.primary_key("logs").await?, None);

    let first = source.fetch_rows("users", Some("id"), 2, 0).await?;
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].get("id"), Some(&SourceValue::Int(1)));
    assert_eq!(first[0].get("name"), Some(&SourceValue::Text("A".into())));
    assert!(matches!(first[0].get("created"), Some(SourceValue::DateTime(_))));
    assert!(matches!(first[0].get("born"), Some(SourceValue::Date(_))));
    assert_eq!(first[0].get("payload"), Some(&SourceValue::Bytes(b"ab".to_vec())));
    assert_eq!(first[1].get("active"), Some(&SourceValue::Null));

    let second = source.fetch_rows("users", Some("id"), 2, 2).await?;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].get("id"), Some(&SourceValue::Int(3)));

    let past_end = source.fetch_rows("users", Some("id"), 2, 4).await?;
    assert!(past_end.is_empty());

    assert!(source.describe_table("missing").await.is_err());

    source.disconnect().await?;
    Ok(())
}
