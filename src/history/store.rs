//! SQLite-backed calculation history
//!
//! Records are append-only. `search` and `count` share one predicate list per
//! filter, so the total always matches what paging returns.

use crate::address::PostalCode;
use crate::error::CostError;
use crate::history::filter::{push_where, Page, PageRequest, SearchFilter};
use crate::living_cost::{CalculationResult, OwnerRef};
use crate::logging::MaskedPostalCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

const RECORD_COLUMNS: &str = "SELECT id, owner_ref, postal_code, region_name, annual_income, \
     monthly_rent, monthly_utilities, monthly_food, monthly_communication, monthly_others, \
     created_at FROM calculation_histories";

/// Stored calculation with identity, owner and creation time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub owner: OwnerRef,
    pub created_at: DateTime<Utc>,
    pub result: CalculationResult,
}

impl sqlx::FromRow<'_, SqliteRow> for HistoryRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_code: String = row.try_get("postal_code")?;
        let postal_code = PostalCode::parse(&raw_code).map_err(|e| sqlx::Error::ColumnDecode {
            index: "postal_code".to_string(),
            source: Box::new(e),
        })?;

        let created_ms: i64 = row.try_get("created_at")?;
        let created_at = DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: "created_at".to_string(),
                source: format!("timestamp out of range: {}", created_ms).into(),
            }
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            owner: OwnerRef::new(row.try_get::<String, _>("owner_ref")?),
            created_at,
            result: CalculationResult {
                postal_code,
                region_name: row.try_get("region_name")?,
                annual_income: row.try_get("annual_income")?,
                monthly_rent: row.try_get("monthly_rent")?,
                monthly_utilities: row.try_get("monthly_utilities")?,
                monthly_food: row.try_get("monthly_food")?,
                monthly_communication: row.try_get("monthly_communication")?,
                monthly_others: row.try_get("monthly_others")?,
            },
        })
    }
}

pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store on a private in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self, CostError> {
        let store = Self::new(super::database::connect_in_memory().await?);
        store.migrate().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) async fn unmigrated_in_memory() -> Result<Self, CostError> {
        Ok(Self::new(super::database::connect_in_memory().await?))
    }

    pub async fn migrate(&self) -> Result<(), CostError> {
        super::database::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist a calculation for `owner`; identity and timestamp are assigned here
    pub async fn append(&self, owner: &OwnerRef, result: &CalculationResult) -> Result<HistoryRecord, CostError> {
        let created_at = Utc::now();

        let id = sqlx::query(
            "INSERT INTO calculation_histories
             (owner_ref, postal_code, region_name, annual_income, monthly_rent, monthly_utilities,
              monthly_food, monthly_communication, monthly_others, monthly_total, annual_total, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner.as_str())
        .bind(result.postal_code.as_str())
        .bind(&result.region_name)
        .bind(result.annual_income)
        .bind(result.monthly_rent)
        .bind(result.monthly_utilities)
        .bind(result.monthly_food)
        .bind(result.monthly_communication)
        .bind(result.monthly_others)
        .bind(result.monthly_total())
        .bind(result.annual_total())
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(id = id, "Calculation history created");

        Ok(HistoryRecord {
            id,
            owner: owner.clone(),
            // Millisecond precision, as stored
            created_at: DateTime::from_timestamp_millis(created_at.timestamp_millis()).unwrap_or(created_at),
            result: result.clone(),
        })
    }

    /// One page of matching records, newest first
    pub async fn search(&self, filter: &SearchFilter, page: PageRequest) -> Result<Vec<HistoryRecord>, CostError> {
        let predicates = filter.predicates();
        debug!(
            owner = if filter.owner.is_some() { "present" } else { "absent" },
            postal_code = %MaskedPostalCode::new(filter.postal_code.as_deref().unwrap_or_default()),
            conditions = predicates.len(),
            page = page.number,
            size = page.size,
            "Searching calculation history"
        );

        let mut builder = QueryBuilder::<Sqlite>::new(RECORD_COLUMNS);
        push_where(&mut builder, predicates);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let records = builder
            .build_query_as::<HistoryRecord>()
            .fetch_all(&self.pool)
            .await?;

        info!(results = records.len(), "Calculation history search completed");
        Ok(records)
    }

    /// Number of records matching `filter`, independent of paging
    pub async fn count(&self, filter: &SearchFilter) -> Result<u64, CostError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM calculation_histories");
        push_where(&mut builder, filter.predicates());

        let total = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    /// Search and count combined into a [`Page`]
    pub async fn page(&self, filter: &SearchFilter, page: PageRequest) -> Result<Page<HistoryRecord>, CostError> {
        let items = self.search(filter, page).await?;
        let total_count = self.count(filter).await?;

        info!(
            results = items.len(),
            total = total_count,
            "Calculation history page loaded"
        );

        Ok(Page {
            items,
            page_number: page.number,
            page_size: page.size,
            total_count,
        })
    }

    /// Newest record for an owner
    pub async fn latest(&self, owner: &OwnerRef) -> Result<Option<HistoryRecord>, CostError> {
        let records = self
            .search(&SearchFilter::for_owner(owner.clone()), PageRequest::first(1))
            .await?;
        Ok(records.into_iter().next())
    }
}
