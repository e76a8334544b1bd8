//! Thin HTTP client for the backend's PostgREST-style API.
//!
//! Speaks the wire dialect only (paths, headers, row arrays, error bodies);
//! which table gets which call is the gateway's business. Every request runs
//! with explicit connect and total timeouts.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::BackendConfig;

const REST_PREFIX: &str = "/rest/v1";
const PROBE_RETRY_DELAY: Duration = Duration::from_millis(250);
const DETAIL_MAX_LEN: usize = 300;

/// Postgres error code for "insufficient privilege", surfaced by the backend
/// when a row-level-security policy denies a write.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Failures talking to the persistence backend.
#[derive(Debug, Error)]
pub enum DbError {
    /// The request never produced a usable response (DNS, connect, timeout).
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend refused the operation under the presented credential.
    #[error("backend policy denied the operation: {detail}")]
    PolicyDenied { detail: String },
    /// The backend answered with a non-policy error.
    #[error("backend rejected the operation ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// The backend answered 2xx but the body was not the expected row shape.
    #[error("backend returned an unexpected body: {0}")]
    Decode(String),
}

/// Which credential a call presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// Public key; what the browser-facing flows insert with.
    Anon,
    /// Privileged key; RPC fallback and admin reads.
    Service,
}

/// PostgREST client bound to one backend deployment.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base: String,
    anon_key: String,
    service_role_key: String,
}

impl RestClient {
    pub fn new(config: &BackendConfig) -> Result<Self, DbError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    /// Whether a privileged credential is configured at all.
    pub fn has_service_credential(&self) -> bool {
        !self.service_role_key.is_empty()
    }

    /// Base URL of the deployment this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str, credential: Credential) -> RequestBuilder {
        let key = match credential {
            Credential::Anon => &self.anon_key,
            Credential::Service => &self.service_role_key,
        };
        self.http
            .request(method, format!("{}{REST_PREFIX}{path}", self.base))
            .header("apikey", key)
            .bearer_auth(key)
    }

    /// `POST /{table}` returning the inserted row.
    pub async fn insert_returning<B, T>(
        &self,
        table: &str,
        body: &B,
        credential: Credential,
    ) -> Result<T, DbError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, &format!("/{table}"), credential)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        first_row(&text)
    }

    /// `POST /rpc/{function}` under the service credential; the function is
    /// expected to return the inserted row (bare object or one-element array).
    pub async fn rpc<B, T>(&self, function: &str, body: &B) -> Result<T, DbError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, &format!("/rpc/{function}"), Credential::Service)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        first_row(&text)
    }

    /// `GET /{table}` with raw query pairs, decoding the row array.
    pub async fn select<T>(
        &self,
        table: &str,
        query: &[(&str, String)],
        credential: Credential,
    ) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, &format!("/{table}"), credential)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| DbError::Decode(e.to_string()))
    }

    /// Exact row count via `Prefer: count=exact` on a zero-row range.
    pub async fn count(&self, table: &str, filters: &[(&str, String)]) -> Result<u64, DbError> {
        let mut query: Vec<(&str, String)> = vec![("select", "id".to_string())];
        query.extend_from_slice(filters);
        let response = self
            .request(Method::GET, &format!("/{table}"), Credential::Service)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        // 206 when rows exist, 200 on an empty table.
        if !status.is_success() {
            let text = response.text().await?;
            return Err(classify_error(status, &text));
        }
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        parse_content_range_total(range)
            .ok_or_else(|| DbError::Decode(format!("unparseable content-range {range:?}")))
    }

    /// `PATCH /{table}?id=eq.{id}` returning the updated row, `None` when the
    /// id matched nothing.
    pub async fn update_returning<B, T>(
        &self,
        table: &str,
        id: i64,
        body: &B,
    ) -> Result<Option<T>, DbError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PATCH, &format!("/{table}"), Credential::Service)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        let mut rows: Vec<T> =
            serde_json::from_str(&text).map_err(|e| DbError::Decode(e.to_string()))?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Reachability probe: one-row select under the public credential, with a
    /// single retry after a short pause.
    pub async fn probe(&self, table: &str) -> Result<(), DbError> {
        match self.try_probe(table).await {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::debug!(error = %first, "backend probe failed, retrying once");
                tokio::time::sleep(PROBE_RETRY_DELAY).await;
                self.try_probe(table).await
            }
        }
    }

    async fn try_probe(&self, table: &str) -> Result<(), DbError> {
        let response = self
            .request(Method::GET, &format!("/{table}"), Credential::Anon)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await?;
            Err(classify_error(status, &text))
        }
    }
}

/// Map an error response onto the taxonomy. Policy denial is exactly an HTTP
/// 401/403 or a body carrying the insufficient-privilege code; everything
/// else is a plain rejection.
fn classify_error(status: StatusCode, body: &str) -> DbError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return DbError::PolicyDenied {
            detail: extract_message(body),
        };
    }
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.get("code").and_then(Value::as_str) == Some(INSUFFICIENT_PRIVILEGE) {
            return DbError::PolicyDenied {
                detail: extract_message(body),
            };
        }
    }
    DbError::Rejected {
        status: status.as_u16(),
        detail: extract_message(body),
    }
}

/// Pull the `message` field out of a PostgREST error body, falling back to
/// the (truncated) raw text.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let mut detail = body.trim().to_string();
    if detail.len() > DETAIL_MAX_LEN {
        detail.truncate(DETAIL_MAX_LEN);
        detail.push_str("...");
    }
    detail
}

/// Decode the first row out of a 2xx body. Inserts and selects come back as
/// arrays; RPC may return a bare object.
fn first_row<T: DeserializeOwned>(text: &str) -> Result<T, DbError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DbError::Decode(e.to_string()))?;
    let row = match value {
        Value::Array(mut rows) => {
            if rows.is_empty() {
                return Err(DbError::Decode("empty result set".to_string()));
            }
            rows.remove(0)
        }
        other => other,
    };
    serde_json::from_value(row).map_err(|e| DbError::Decode(e.to_string()))
}

/// Total out of a `Content-Range` value like `0-0/57` or `*/57`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_forbidden_is_policy_denial() {
        let err = classify_error(StatusCode::FORBIDDEN, r#"{"message":"denied"}"#);
        match err {
            DbError::PolicyDenied { detail } => assert_eq!(detail, "denied"),
            other => panic!("expected PolicyDenied, got {other:?}"),
        }
    }

    #[test]
    fn insufficient_privilege_code_is_policy_denial() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, DbError::PolicyDenied { .. }));
    }

    #[test]
    fn other_errors_are_plain_rejections() {
        let body = r#"{"code":"23505","message":"duplicate key"}"#;
        match classify_error(StatusCode::CONFLICT, body) {
            DbError::Rejected { status, detail } => {
                assert_eq!(status, 409);
                assert_eq!(detail, "duplicate key");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn unstructured_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match classify_error(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            DbError::Rejected { detail, .. } => {
                assert!(detail.len() <= DETAIL_MAX_LEN + 3);
                assert!(detail.ends_with("..."));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn first_row_unwraps_arrays_and_accepts_bare_objects() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: i64,
        }
        let from_array: Row = first_row(r#"[{"id":7}]"#).unwrap();
        assert_eq!(from_array.id, 7);
        let from_object: Row = first_row(r#"{"id":9}"#).unwrap();
        assert_eq!(from_object.id, 9);
        assert!(first_row::<Row>("[]").is_err());
    }

    #[test]
    fn content_range_totals_parse() {
        assert_eq!(parse_content_range_total("0-0/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
