//! Entity-level persistence operations.
//!
//! The gateway owns the table names, the privileged-procedure fallback for
//! public inserts, and the pagination contract for admin reads. Handlers talk
//! to this type, never to the REST client directly.

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::db::client::{Credential, DbError, RestClient};
use crate::forms::{
    ApplicationStatus, CareerRow, ContactRow, NewCareerApplication, NewContact,
};
use crate::observability::metrics;

const CONTACT_TABLE: &str = "contact_submissions";
const CAREER_TABLE: &str = "career_applications";
const CONTACT_INSERT_FN: &str = "insert_contact_submission";
const CAREER_INSERT_FN: &str = "insert_career_application";

/// Sortable columns for admin lists. The first entry is the default and pairs
/// with descending order, so lists open newest-first.
pub const CONTACT_SORT_COLUMNS: &[&str] = &["created_at", "full_name", "email"];
pub const CAREER_SORT_COLUMNS: &[&str] = &["applied_at", "full_name", "application_status"];

/// Resolve a requested sort column against an allow-list; `None` means the
/// caller asked for a column that is not sortable.
pub fn resolve_sort(
    allowed: &'static [&'static str],
    requested: Option<&str>,
) -> Option<&'static str> {
    match requested {
        None => allowed.first().copied(),
        Some(name) => allowed.iter().find(|c| **c == name).copied(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDir::Asc),
            "desc" => Some(SortDir::Desc),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

/// Validated pagination request. `page` is 1-based and `limit` is capped by
/// the route layer; `sort` always comes out of an allow-list.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub sort: &'static str,
    pub dir: SortDir,
}

impl Pagination {
    // u64: page * limit can exceed u32 for large page numbers.
    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }
}

/// One page of rows plus the totals the admin UI paginates with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PageOf<T> {
    fn new(items: Vec<T>, pagination: &Pagination, total: u64) -> Self {
        Self {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(u64::from(pagination.limit)),
        }
    }
}

/// Contact-side aggregate counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total: u64,
    pub last_seven_days: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: u64,
}

/// Career-side aggregate counts, one entry per pipeline status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerStats {
    pub total: u64,
    pub by_status: Vec<StatusCount>,
}

/// Persistence operations over both submission tables.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: RestClient,
}

impl Gateway {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Host the gateway is bound to, for status reporting.
    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    /// Reachability probe against the contact table.
    pub async fn probe(&self) -> Result<(), DbError> {
        self.client.probe(CONTACT_TABLE).await
    }

    /// Insert a contact submission, falling back to the privileged procedure
    /// when the public credential is denied by policy.
    pub async fn insert_contact(&self, record: &NewContact) -> Result<ContactRow, DbError> {
        self.insert_with_fallback(CONTACT_TABLE, CONTACT_INSERT_FN, record)
            .await
    }

    /// Insert a career application with the same fallback contract.
    pub async fn insert_application(
        &self,
        record: &NewCareerApplication,
    ) -> Result<CareerRow, DbError> {
        self.insert_with_fallback(CAREER_TABLE, CAREER_INSERT_FN, record)
            .await
    }

    async fn insert_with_fallback<B, T>(
        &self,
        table: &'static str,
        function: &'static str,
        record: &B,
    ) -> Result<T, DbError>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        match self
            .client
            .insert_returning(table, record, Credential::Anon)
            .await
        {
            Err(DbError::PolicyDenied { detail }) if self.client.has_service_credential() => {
                tracing::warn!(
                    table,
                    detail = %detail,
                    "direct insert denied by policy, falling back to privileged procedure"
                );
                metrics::record_rpc_fallback(table);
                self.client.rpc(function, &json!({ "record": record })).await
            }
            result => result,
        }
    }

    pub async fn list_contacts(
        &self,
        pagination: &Pagination,
    ) -> Result<PageOf<ContactRow>, DbError> {
        let total = self.client.count(CONTACT_TABLE, &[]).await?;
        let rows = self
            .client
            .select(CONTACT_TABLE, &list_query(pagination), Credential::Service)
            .await?;
        Ok(PageOf::new(rows, pagination, total))
    }

    pub async fn get_contact(&self, id: i64) -> Result<Option<ContactRow>, DbError> {
        let rows: Vec<ContactRow> = self
            .client
            .select(CONTACT_TABLE, &by_id_query(id), Credential::Service)
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn contact_stats(&self) -> Result<ContactStats, DbError> {
        let total = self.client.count(CONTACT_TABLE, &[]).await?;
        let cutoff = Utc::now() - ChronoDuration::days(7);
        let last_seven_days = self
            .client
            .count(
                CONTACT_TABLE,
                &[("created_at", format!("gte.{}", cutoff.to_rfc3339()))],
            )
            .await?;
        Ok(ContactStats {
            total,
            last_seven_days,
        })
    }

    pub async fn list_applications(
        &self,
        pagination: &Pagination,
    ) -> Result<PageOf<CareerRow>, DbError> {
        let total = self.client.count(CAREER_TABLE, &[]).await?;
        let rows = self
            .client
            .select(CAREER_TABLE, &list_query(pagination), Credential::Service)
            .await?;
        Ok(PageOf::new(rows, pagination, total))
    }

    pub async fn get_application(&self, id: i64) -> Result<Option<CareerRow>, DbError> {
        let rows: Vec<CareerRow> = self
            .client
            .select(CAREER_TABLE, &by_id_query(id), Credential::Service)
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn career_stats(&self) -> Result<CareerStats, DbError> {
        let total = self.client.count(CAREER_TABLE, &[]).await?;
        let mut by_status = Vec::with_capacity(ApplicationStatus::ALL.len());
        for status in ApplicationStatus::ALL {
            let count = self
                .client
                .count(
                    CAREER_TABLE,
                    &[("application_status", format!("eq.{}", status.as_str()))],
                )
                .await?;
            by_status.push(StatusCount { status, count });
        }
        Ok(CareerStats { total, by_status })
    }

    /// Move an application to a new pipeline status, optionally replacing the
    /// reviewer notes. `Ok(None)` when the id matches no row.
    pub async fn update_application_status(
        &self,
        id: i64,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Option<CareerRow>, DbError> {
        let mut body = json!({
            "application_status": status,
            "updated_at": Utc::now(),
        });
        if let Some(notes) = notes {
            body["admin_notes"] = Value::String(notes);
        }
        self.client.update_returning(CAREER_TABLE, id, &body).await
    }
}

fn list_query(pagination: &Pagination) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        (
            "order",
            format!("{}.{}", pagination.sort, pagination.dir.as_str()),
        ),
        ("limit", pagination.limit.to_string()),
        ("offset", pagination.offset().to_string()),
    ]
}

fn by_id_query(id: i64) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("id", format!("eq.{id}")),
        ("limit", "1".to_string()),
    ]
}
