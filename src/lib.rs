//! Rebate Application Core
//!
//! In-memory master-detail aggregation store and query engine for rebate
//! applications: a hierarchical reference-data catalog, continuously
//! re-derived financial aggregates over a one-to-many header/line entity,
//! and filtered, sorted, paginated views with relation hydration.
//!
//! The crate is a library-level contract meant to sit behind whatever
//! transport the host chooses. All logic is synchronous and assumes one
//! in-flight mutation at a time; a multi-threaded host serializes callers
//! around the shared [`store::RebateStore`] handle.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

mod aggregation;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod errors;
pub mod pricing;
pub mod queries;
pub mod seed;
pub mod services;
pub mod store;

use serde::{Deserialize, Serialize};

pub use catalog::Catalog;
pub use config::StoreConfig;
pub use errors::ServiceError;
pub use seed::SeedData;
pub use services::RebateService;
pub use store::RebateStore;

/// Paginated result wrapper shared by list queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    /// Filter-match count before the page slice.
    pub total: u64,
    /// 1-indexed page number.
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
