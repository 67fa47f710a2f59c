//! BitableClient: BaseSink over HTTP.

use crate::wire::{
    decode_envelope, CreatedRecords, CreatedTable, RecordList, TableList,
};
use crate::BaseOpts;
use async_trait::async_trait;
use base_sink::{BaseSink, PageRequest, RecordPage, RecordUpdate, SinkError, TableSpec};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use sync_core::Fields;
use tracing::debug;

/// Page size used when listing tables.
const TABLE_PAGE_SIZE: usize = 100;

/// Client bound to one app.
#[derive(Debug, Clone)]
pub struct BitableClient {
    http: Client,
    base_url: String,
    app_token: String,
    bearer: String,
}

impl BitableClient {
    pub fn new(opts: &BaseOpts) -> Result<Self, SinkError> {
        let http = Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: opts.base_url(),
            app_token: opts.app_token.clone(),
            bearer: opts.personal_base_token.clone(),
        })
    }

    fn tables_url(&self) -> String {
        format!(
            "{}/open-apis/bitable/v1/apps/{}/tables",
            self.base_url, self.app_token
        )
    }

    fn records_url(&self, table_id: &str) -> String {
        format!("{}/{table_id}/records", self.tables_url())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SinkError> {
        let response = request
            .bearer_auth(&self.bearer)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(format!("failed to read response body: {e}")))?;

        decode_envelope(status, &body)
    }
}

#[async_trait]
impl BaseSink for BitableClient {
    async fn list_tables(&self) -> Result<HashMap<String, String>, SinkError> {
        let mut tables = HashMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("page_size", TABLE_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let page: TableList = self
                .send(self.http.get(self.tables_url()).query(&query))
                .await?;

            for item in page.items.unwrap_or_default() {
                tables.insert(item.name, item.table_id);
            }

            match (page.has_more, page.page_token) {
                (true, Some(token)) => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} destination tables", tables.len());
        Ok(tables)
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<String, SinkError> {
        debug!(
            "Creating destination table '{}' with {} fields",
            spec.name,
            spec.fields.len()
        );
        let created: CreatedTable = self
            .send(self.http.post(self.tables_url()).json(&json!({ "table": spec })))
            .await?;
        Ok(created.table_id)
    }

    async fn list_records(
        &self,
        table_id: &str,
        request: &PageRequest,
    ) -> Result<RecordPage, SinkError> {
        let mut query = vec![("page_size", request.page_size.to_string())];
        if let Some(token) = &request.page_token {
            query.push(("page_token", token.clone()));
        }

        let list: RecordList = self
            .send(self.http.get(self.records_url(table_id)).query(&query))
            .await?;

        Ok(RecordPage {
            items: list
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|raw| raw.into_record())
                .collect(),
            has_more: list.has_more,
            page_token: list.page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn batch_create(
        &self,
        table_id: &str,
        records: &[Fields],
    ) -> Result<Vec<String>, SinkError> {
        let body = json!({
            "records": records
                .iter()
                .map(|fields| json!({ "fields": fields }))
                .collect::<Vec<_>>()
        });
        let url = format!("{}/batch_create", self.records_url(table_id));
        let created: CreatedRecords = self.send(self.http.post(url).json(&body)).await?;

        if created.records.len() != records.len() {
            return Err(SinkError::Decode(format!(
                "batch_create returned {} records for {} inputs",
                created.records.len(),
                records.len()
            )));
        }
        Ok(created.records.into_iter().map(|r| r.record_id).collect())
    }

    async fn batch_update(
        &self,
        table_id: &str,
        records: &[RecordUpdate],
    ) -> Result<(), SinkError> {
        let url = format!("{}/batch_update", self.records_url(table_id));
        let _: serde_json::Value = self
            .send(self.http.post(url).json(&json!({ "records": records })))
            .await?;
        Ok(())
    }
}
