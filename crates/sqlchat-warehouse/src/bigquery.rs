//! BigQuery warehouse over the REST `jobs.query` API.
//!
//! Submits a query job, polls `jobs.getQueryResults` while the job is still
//! running, then follows `pageToken` until every page is read. BigQuery
//! reports every cell as a string, so cells are converted back to JSON
//! numbers/booleans using the returned schema.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, info, warn};

use sqlchat_core::config::WarehouseConfig;
use sqlchat_core::RetryPolicy;

use crate::error::WarehouseError;
use crate::result::{QueryResult, Row};
use crate::Warehouse;

const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Added to the server-side `timeoutMs` to get the HTTP client timeout.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    use_legacy_sql: bool,
    timeout_ms: u64,
    location: &'a str,
}

/// Body of both `jobs.query` and `jobs.getQueryResults`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    schema: Option<TableSchema>,
    total_rows: Option<String>,
    page_token: Option<String>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(default)]
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: Value,
}

// =============================================================================
// BigQueryWarehouse
// =============================================================================

/// BigQuery client authenticated with a pre-issued bearer token.
pub struct BigQueryWarehouse {
    client: reqwest::Client,
    base_url: String,
    project: String,
    location: String,
    token: String,
    timeout_ms: u64,
    retry: RetryPolicy,
}

impl BigQueryWarehouse {
    /// Create a client for the project named in `config`.
    pub fn new(config: &WarehouseConfig, token: impl Into<String>) -> Result<Self, WarehouseError> {
        let client = reqwest::Client::builder()
            .timeout(http_timeout(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            project: config.project.clone(),
            location: config.location.clone(),
            token: token.into(),
            timeout_ms: config.timeout_secs.saturating_mul(1000),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    /// Point the client at a different API root (emulators, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn queries_url(&self) -> String {
        format!("{}/projects/{}/queries", self.base_url, self.project)
    }

    /// Start a query job. The response may hold the first page already.
    async fn submit(&self, sql: &str) -> Result<QueryResponse, WarehouseError> {
        let request = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            timeout_ms: self.timeout_ms,
            location: &self.location,
        };
        self.send(self.client.post(self.queries_url()).json(&request))
            .await
    }

    /// `jobs.getQueryResults` for a job started by [`submit`](Self::submit).
    async fn fetch_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, WarehouseError> {
        let location = job.location.as_deref().unwrap_or(&self.location);
        let mut params = vec![
            ("location", location.to_string()),
            ("timeoutMs", self.timeout_ms.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let url = format!("{}/{}", self.queries_url(), job.job_id);
        self.send(self.client.get(url).query(&params)).await
    }

    /// One status check of a running job; still running is `Incomplete`.
    async fn poll(&self, job: &JobReference) -> Result<QueryResponse, WarehouseError> {
        let response = self.fetch_results(job, None).await?;
        if !response.job_complete {
            debug!(job = %job.job_id, "BigQuery job still running");
            return Err(WarehouseError::Incomplete);
        }
        Ok(response)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<QueryResponse, WarehouseError> {
        let response = request.bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "BigQuery request failed");
            return Err(WarehouseError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| WarehouseError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    fn name(&self) -> &str {
        "bigquery"
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        let mut response = self
            .retry
            .retry_if(|| self.submit(sql), WarehouseError::is_transient)
            .await?;

        let job = response.job_reference.take();

        if !response.job_complete {
            let running = job.as_ref().ok_or_else(missing_job_reference)?;
            info!(job = %running.job_id, "BigQuery job still running, polling for results");
            response = self
                .retry
                .retry_if(
                    || self.poll(running),
                    |e: &WarehouseError| {
                        matches!(e, WarehouseError::Incomplete) || e.is_transient()
                    },
                )
                .await?;
        }

        let fields = response.schema.take().map(|s| s.fields).unwrap_or_default();
        let columns: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        let mut rows = decode_rows(&fields, std::mem::take(&mut response.rows))?;

        let mut page_token = response.page_token.take();
        while let Some(token) = page_token {
            let paged = job.as_ref().ok_or_else(missing_job_reference)?;
            let page = self
                .retry
                .retry_if(
                    || self.fetch_results(paged, Some(token.as_str())),
                    WarehouseError::is_transient,
                )
                .await?;
            rows.extend(decode_rows(&fields, page.rows)?);
            page_token = page.page_token;
        }

        check_row_count(response.total_rows.as_deref(), rows.len())?;
        info!(rows = rows.len(), "BigQuery query executed");
        Ok(QueryResult::new(columns, rows))
    }
}

fn http_timeout(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs) + HTTP_TIMEOUT_MARGIN
}

fn missing_job_reference() -> WarehouseError {
    WarehouseError::Decode("response is missing jobReference".to_string())
}

fn decode_rows(fields: &[FieldSchema], rows: Vec<TableRow>) -> Result<Vec<Row>, WarehouseError> {
    let mut decoded = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        if row.f.len() != fields.len() {
            return Err(WarehouseError::Decode(format!(
                "row {} has {} cells but schema has {} fields",
                idx,
                row.f.len(),
                fields.len()
            )));
        }
        let mut map = Row::new();
        for (field, cell) in fields.iter().zip(row.f) {
            map.insert(field.name.clone(), convert_cell(cell.v, &field.field_type));
        }
        decoded.push(map);
    }

    debug!(columns = fields.len(), rows = decoded.len(), "Decoded BigQuery rows");
    Ok(decoded)
}

/// `totalRows` is a decimal string; an absent or unparsable value is not checked.
fn check_row_count(total_rows: Option<&str>, received: usize) -> Result<(), WarehouseError> {
    let Some(total) = total_rows.and_then(|t| t.parse::<u64>().ok()) else {
        return Ok(());
    };
    if (received as u64) < total {
        return Err(WarehouseError::Decode(format!(
            "received {} of {} result rows",
            received, total
        )));
    }
    Ok(())
}

/// Convert a string-encoded cell to a typed JSON value.
///
/// Values that fail to parse are kept as strings.
fn convert_cell(value: Value, field_type: &str) -> Value {
    let s = match value {
        Value::String(s) => s,
        other => return other,
    };
    match field_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => s.parse::<i64>().map(Value::from).unwrap_or(Value::String(s)),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(s)),
        "BOOLEAN" | "BOOL" => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(s),
        },
        _ => Value::String(s),
    }
}
