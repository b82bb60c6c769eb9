//! Access to the single tribute row held in a hosted PostgREST-style datastore.
//!
//! Every operation is one request (or a short fixed sequence of requests) with
//! no retry. Concurrent writers race on the row; the last write to a field wins.

use crate::config::RemoteConfig;
use crate::errors::RemoteError;
use crate::models::{TributeRecord, TributeUpdate};
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE},
    Method, RequestBuilder, StatusCode,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};
use uuid::Uuid;

pub const TABLE: &str = "yzn_tributes";

/// Idempotent schema setup: table, open read/update policies, one seed row.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS yzn_tributes (
  id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
  candles bigint DEFAULT 0,
  flowers bigint DEFAULT 0,
  updated_at timestamptz DEFAULT now()
);

ALTER TABLE yzn_tributes
  ALTER COLUMN candles TYPE bigint,
  ALTER COLUMN flowers TYPE bigint;

INSERT INTO yzn_tributes (candles, flowers)
SELECT 0, 0
WHERE NOT EXISTS (SELECT 1 FROM yzn_tributes);

ALTER TABLE yzn_tributes ENABLE ROW LEVEL SECURITY;

DROP POLICY IF EXISTS "Anyone can view tribute counts" ON yzn_tributes;
CREATE POLICY "Anyone can view tribute counts"
  ON yzn_tributes FOR SELECT TO public USING (true);

DROP POLICY IF EXISTS "Anyone can send tributes" ON yzn_tributes;
CREATE POLICY "Anyone can send tributes"
  ON yzn_tributes FOR UPDATE TO public USING (true);
"#;

const COLUMNS: &str = "id,candles,flowers,updated_at";

/// The live row is the one with the lowest id. Updates never change an id, so
/// reads and writes keep landing on the same row when duplicates exist.
const ROW_ORDER: &str = "id.asc";

#[allow(async_fn_in_trait)]
pub trait TributeTable {
    /// Creates the table when absent and seeds a zero row when it is empty.
    async fn ensure_schema(&self) -> Result<TributeRecord, RemoteError>;

    async fn fetch_row(&self) -> Result<TributeRecord, RemoteError>;

    /// Writes the provided fields and refreshes `updated_at`.
    async fn update_row(&self, update: TributeUpdate) -> Result<TributeRecord, RemoteError>;

    /// Connection check. Returns the exact row count when the server reports one.
    async fn ping(&self) -> Result<Option<u64>, RemoteError>;

    async fn insert_seed(&self) -> Result<TributeRecord, RemoteError>;
}

#[derive(Serialize)]
struct RowPatch {
    #[serde(flatten)]
    update: TributeUpdate,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SeedRow {
    candles: u64,
    flowers: u64,
}

#[derive(Serialize)]
struct ExecSql<'a> {
    sql_query: &'a str,
}

/// REST client for the hosted table.
#[derive(Clone)]
pub struct RestTable {
    http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl RestTable {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.clone(),
            headers: auth_headers(&config.anon_key),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).headers(self.headers.clone())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, RemoteError> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        if status == StatusCode::NOT_FOUND && body.contains(TABLE) {
            return Err(RemoteError::MissingTable);
        }
        Err(RemoteError::Api {
            status: status.as_u16(),
            message: body,
        })
    }

    async fn first_row(&self, request: RequestBuilder) -> Result<TributeRecord, RemoteError> {
        let body = self.send(request).await?;
        let rows: Vec<TributeRecord> = serde_json::from_str(&body)?;
        rows.into_iter().next().ok_or(RemoteError::NoRow)
    }

    async fn exec_sql(&self, sql: &str) -> Result<(), RemoteError> {
        let url = format!("{}/rest/v1/rpc/exec_sql", self.base_url);
        let request = self
            .request(Method::POST, &url)
            .json(&ExecSql { sql_query: sql });
        self.send(request).await?;
        Ok(())
    }
}

impl TributeTable for RestTable {
    async fn ensure_schema(&self) -> Result<TributeRecord, RemoteError> {
        self.exec_sql(SCHEMA_SQL).await?;
        debug!("tribute schema applied");
        self.fetch_row().await
    }

    async fn fetch_row(&self) -> Result<TributeRecord, RemoteError> {
        let request = self
            .request(Method::GET, &self.table_url())
            .query(&[("select", COLUMNS), ("order", ROW_ORDER), ("limit", "1")]);
        self.first_row(request).await
    }

    async fn update_row(&self, update: TributeUpdate) -> Result<TributeRecord, RemoteError> {
        let current = self.fetch_row().await?;
        let patch = RowPatch {
            update,
            updated_at: Utc::now(),
        };
        let request = self
            .request(Method::PATCH, &self.table_url())
            .query(&[("id", format!("eq.{}", current.id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.first_row(request).await
    }

    async fn ping(&self) -> Result<Option<u64>, RemoteError> {
        let request = self
            .request(Method::HEAD, &self.table_url())
            .query(&[("select", "id")])
            .header("Prefer", "count=exact");
        let resp = request.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::MissingTable);
        }
        if !status.is_success() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        Ok(resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total))
    }

    async fn insert_seed(&self) -> Result<TributeRecord, RemoteError> {
        let request = self
            .request(Method::POST, &self.table_url())
            .header("Prefer", "return=representation")
            .json(&SeedRow {
                candles: 0,
                flowers: 0,
            });
        self.first_row(request).await
    }
}

/// `apikey` and bearer headers. `RemoteConfig::from_lookup` rejects keys that
/// are not valid header values.
fn auth_headers(anon_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match (
        HeaderValue::from_str(anon_key),
        HeaderValue::from_str(&format!("Bearer {anon_key}")),
    ) {
        (Ok(key), Ok(bearer)) => {
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }
        _ => error!("remote key is not a valid header value, requests will be unauthenticated"),
    }
    headers
}

/// Total from a `Content-Range` header such as `0-0/1` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[derive(Debug, Default)]
struct TableState {
    created: bool,
    rows: Vec<TributeRecord>,
}

impl TableState {
    fn live_row(&mut self) -> Option<&mut TributeRecord> {
        self.rows.iter_mut().min_by_key(|row| row.id)
    }
}

/// In-process stand-in for the hosted table. Clones share the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    state: Arc<Mutex<TableState>>,
}

impl MemoryTable {
    /// A datastore where the tribute table has not been created yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A created table without any rows.
    pub fn empty() -> Self {
        let table = Self::new();
        table.lock().created = true;
        table
    }

    pub fn with_row(candles: u64, flowers: u64) -> Self {
        let table = Self::empty();
        table.lock().rows.push(new_record(candles, flowers));
        table
    }

    pub fn row_count(&self) -> usize {
        self.lock().rows.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds another row next to any existing ones.
    pub fn push_row(&self, candles: u64, flowers: u64) -> TributeRecord {
        let record = new_record(candles, flowers);
        self.lock().rows.push(record.clone());
        record
    }

    fn with_table<R>(
        &self,
        f: impl FnOnce(&mut TableState) -> Result<R, RemoteError>,
    ) -> Result<R, RemoteError> {
        let mut state = self.lock();
        if !state.created {
            return Err(RemoteError::MissingTable);
        }
        f(&mut state)
    }
}

fn new_record(candles: u64, flowers: u64) -> TributeRecord {
    TributeRecord {
        id: Uuid::new_v4(),
        candles,
        flowers,
        updated_at: Utc::now(),
    }
}

impl TributeTable for MemoryTable {
    async fn ensure_schema(&self) -> Result<TributeRecord, RemoteError> {
        let mut state = self.lock();
        state.created = true;
        if state.rows.is_empty() {
            state.rows.push(new_record(0, 0));
        }
        state.live_row().cloned().ok_or(RemoteError::NoRow)
    }

    async fn fetch_row(&self) -> Result<TributeRecord, RemoteError> {
        self.with_table(|state| state.live_row().cloned().ok_or(RemoteError::NoRow))
    }

    async fn update_row(&self, update: TributeUpdate) -> Result<TributeRecord, RemoteError> {
        self.with_table(|state| {
            let row = state.live_row().ok_or(RemoteError::NoRow)?;
            update.apply(row);
            row.updated_at = Utc::now().max(row.updated_at);
            Ok(row.clone())
        })
    }

    async fn ping(&self) -> Result<Option<u64>, RemoteError> {
        self.with_table(|state| Ok(Some(state.rows.len() as u64)))
    }

    async fn insert_seed(&self) -> Result<TributeRecord, RemoteError> {
        self.with_table(|state| {
            let record = new_record(0, 0);
            state.rows.push(record.clone());
            Ok(record)
        })
    }
}
