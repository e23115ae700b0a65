//! History search filter and its SQL predicates
//!
//! Each present filter field becomes one [`Predicate`]: column, comparison and
//! bound value travel together, so clause text and parameter order cannot
//! drift apart. Values are always bound, never interpolated.

use crate::address::postal_code::normalize;
use crate::error::CostError;
use crate::living_cost::OwnerRef;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

/// Optional predicates over history records, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub owner: Option<OwnerRef>,
    /// Exact match on the normalized code
    pub postal_code: Option<String>,
    /// Inclusive lower bound
    pub min_annual_income: Option<i64>,
    /// Inclusive upper bound
    pub max_annual_income: Option<i64>,
}

impl SearchFilter {
    pub fn for_owner(owner: OwnerRef) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Predicates for the present fields, in a fixed order
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(owner) = &self.owner {
            predicates.push(Predicate::new(
                "owner_ref",
                Comparison::Eq,
                BindValue::Text(owner.as_str().to_string()),
            ));
        }

        if let Some(code) = self.postal_code.as_deref().map(normalize) {
            if !code.is_empty() {
                predicates.push(Predicate::new("postal_code", Comparison::Eq, BindValue::Text(code)));
            }
        }

        if let Some(min) = self.min_annual_income {
            predicates.push(Predicate::new("annual_income", Comparison::Gte, BindValue::Integer(min)));
        }

        if let Some(max) = self.max_annual_income {
            predicates.push(Predicate::new("annual_income", Comparison::Lte, BindValue::Integer(max)));
        }

        predicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => " = ",
            Self::Gte => " >= ",
            Self::Lte => " <= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    Integer(i64),
}

/// One `column <op> ?` condition with its bound value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: &'static str,
    pub comparison: Comparison,
    pub value: BindValue,
}

impl Predicate {
    fn new(column: &'static str, comparison: Comparison, value: BindValue) -> Self {
        Self {
            column,
            comparison,
            value,
        }
    }
}

/// Append `WHERE 1 = 1 AND ...` for the given predicates
pub fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, predicates: Vec<Predicate>) {
    builder.push(" WHERE 1 = 1");
    for predicate in predicates {
        builder
            .push(" AND ")
            .push(predicate.column)
            .push(predicate.comparison.as_sql());
        match predicate.value {
            BindValue::Text(text) => builder.push_bind(text),
            BindValue::Integer(number) => builder.push_bind(number),
        };
    }
}

/// Zero-based page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(number: u32, size: u32) -> Result<Self, CostError> {
        if size == 0 {
            return Err(CostError::InvalidParameter("page size must be at least 1".to_string()));
        }
        Ok(Self { number, size })
    }

    /// First page of the given size (at least 1)
    pub fn first(size: u32) -> Self {
        Self {
            number: 0,
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            number: self.number + 1,
            size: self.size,
        }
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_number) + 1 < self.total_pages()
    }
}
