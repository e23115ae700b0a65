//! Calculation history persistence and search

pub mod database;
pub mod filter;
pub mod store;

pub use filter::{BindValue, Comparison, Page, PageRequest, Predicate, SearchFilter};
pub use store::{HistoryRecord, HistoryStore};
