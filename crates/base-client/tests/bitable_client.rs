use base_client::{BaseOpts, BitableClient};
use base_sink::{BaseSink, FieldDefinition, PageRequest, RecordUpdate, SinkError, TableSpec};
use serde_json::json;
use sync_core::{FieldValue, Fields};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP: &str = "app123";

fn client_for(server: &MockServer) -> BitableClient {
    let mut opts = BaseOpts::new(APP, "pbt-secret");
    opts.api_url = Some(server.uri());
    BitableClient::new(&opts).unwrap()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "msg": "success", "data": data}))
}

fn tables_path() -> String {
    format!("/open-apis/bitable/v1/apps/{APP}/tables")
}

// ── list_tables ─────────────────────────────────────────────────

#[tokio::test]
async fn list_tables_sends_bearer_token_and_follows_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tables_path()))
        .and(header("authorization", "Bearer pbt-secret"))
        .and(query_param("page_token", "next"))
        .respond_with(ok(json!({
            "has_more": false,
            "items": [{"table_id": "tbl2", "name": "orders", "revision": 1}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(tables_path()))
        .and(header("authorization", "Bearer pbt-secret"))
        .respond_with(ok(json!({
            "has_more": true,
            "page_token": "next",
            "items": [{"table_id": "tbl1", "name": "users", "revision": 1}]
        })))
        .mount(&server)
        .await;

    let tables = client_for(&server).list_tables().await.unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables.get("users").map(String::as_str), Some("tbl1"));
    assert_eq!(tables.get("orders").map(String::as_str), Some("tbl2"));
}

#[tokio::test]
async fn list_tables_reports_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(tables_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 91403,
            "msg": "Forbidden"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tables().await.unwrap_err();
    match err {
        SinkError::Api { code, message } => {
            assert_eq!(code, 91403);
            assert_eq!(message, "Forbidden");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let mut opts = BaseOpts::new(APP, "token");
    opts.api_url = Some("http://127.0.0.1:1".into());
    let client = BitableClient::new(&opts).unwrap();

    let err = client.list_tables().await.unwrap_err();
    assert!(matches!(err, SinkError::Transport(_)), "{err:?}");
}

// ── create_table ────────────────────────────────────────────────

#[tokio::test]
async fn create_table_posts_wrapped_spec() {
    let server = MockServer::start().await;
    let spec = TableSpec {
        name: "users".into(),
        default_view_name: "Grid".into(),
        fields: vec![FieldDefinition {
            field_name: "id".into(),
            type_code: 2,
            ui_type: None,
            property: None,
        }],
    };

    Mock::given(method("POST"))
        .and(path(tables_path()))
        .and(body_json(json!({
            "table": {
                "name": "users",
                "default_view_name": "Grid",
                "fields": [{"field_name": "id", "type": 2}]
            }
        })))
        .respond_with(ok(json!({"table_id": "tblNew", "default_view_id": "vew1"})))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server).create_table(&spec).await.unwrap();
    assert_eq!(id, "tblNew");
}

// ── list_records ────────────────────────────────────────────────

#[tokio::test]
async fn list_records_passes_cursor_and_normalises_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/tbl1/records", tables_path())))
        .and(query_param("page_size", "500"))
        .and(query_param("page_token", "cursor-1"))
        .respond_with(ok(json!({
            "has_more": true,
            "page_token": "cursor-2",
            "total": 3,
            "items": [
                {"record_id": "rec1", "fields": {"id": 1, "name": [{"type": "text", "text": "A"}]}},
                {"record_id": "rec2", "fields": {"id": 2}}
            ]
        })))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list_records("tbl1", &PageRequest::after(500, "cursor-1"))
        .await
        .unwrap();

    assert!(page.has_more);
    assert_eq!(page.page_token.as_deref(), Some("cursor-2"));
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].record_id, "rec1");
    assert_eq!(
        page.items[0].fields.get("name"),
        Some(&FieldValue::Text("A".into()))
    );
}

#[tokio::test]
async fn list_records_handles_empty_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/tbl1/records", tables_path())))
        .respond_with(ok(json!({"has_more": false, "page_token": "", "total": 0, "items": null})))
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list_records("tbl1", &PageRequest::first(500))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
    assert_eq!(page.page_token, None);
}

// ── batch writes ────────────────────────────────────────────────

#[tokio::test]
async fn batch_create_returns_ids_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/tbl1/records/batch_create", tables_path())))
        .and(body_json(json!({
            "records": [{"fields": {"id": 1}}, {"fields": {"id": 2}}]
        })))
        .respond_with(ok(json!({
            "records": [
                {"record_id": "recA", "fields": {"id": 1}},
                {"record_id": "recB", "fields": {"id": 2}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records: Vec<Fields> = (1..=2)
        .map(|i| Fields::from([("id".to_string(), FieldValue::Integer(i))]))
        .collect();
    let ids = client_for(&server)
        .batch_create("tbl1", &records)
        .await
        .unwrap();
    assert_eq!(ids, vec!["recA", "recB"]);
}

#[tokio::test]
async fn batch_update_surfaces_destination_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}/tbl1/records/batch_update", tables_path())))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 1254045,
            "msg": "FieldNameNotFound"
        })))
        .mount(&server)
        .await;

    let updates = vec![RecordUpdate {
        record_id: "rec1".into(),
        fields: Fields::from([("ghost".to_string(), FieldValue::Integer(1))]),
    }];
    let err = client_for(&server)
        .batch_update("tbl1", &updates)
        .await
        .unwrap_err();
    assert_eq!(err.message(), "FieldNameNotFound");
}
