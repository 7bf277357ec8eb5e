//! Search, direct lookup, and statistics queries.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::entities::rebate::{
    RebateApplication, RebateStats, RebateStatus, RebateWithRelations,
};
use crate::errors::ServiceError;
use crate::store::RebateStore;
use crate::PaginatedResult;

use super::{hydrate_application, Query};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Search parameter set. All predicates are optional and AND-combined.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RebateSearchParams {
    /// Substring match on the application number.
    pub application_number: Option<String>,
    pub corporation_id: Option<String>,
    pub category_id: Option<String>,
    pub sales_dept_id: Option<String>,
    pub budget_dept_id: Option<String>,
    /// Claim period containment: header start on or after this date.
    pub period_start: Option<NaiveDate>,
    /// Claim period containment: header end on or before this date.
    pub period_end: Option<NaiveDate>,
    pub status: Option<RebateStatus>,
    pub applicant_id: Option<String>,
    /// Substring match on the title.
    pub title: Option<String>,
    /// Header matches when it contains any of these model ids.
    pub model_ids: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    /// 1-indexed.
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Paginated, hydrated search over headers.
///
/// Rows whose relations cannot all be resolved are dropped from `data` with a
/// warning; `total` still counts every filter match, so degradation narrows a
/// page without failing the query.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRebatesQuery {
    pub params: RebateSearchParams,
}

impl SearchRebatesQuery {
    fn matches(&self, header: &RebateApplication) -> bool {
        let p = &self.params;

        if let Some(needle) = &p.application_number {
            if !header.application_number.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(id) = &p.corporation_id {
            if &header.corporation_id != id {
                return false;
            }
        }
        if let Some(id) = &p.category_id {
            if &header.category_id != id {
                return false;
            }
        }
        if let Some(id) = &p.sales_dept_id {
            if &header.sales_dept_id != id {
                return false;
            }
        }
        if let Some(id) = &p.budget_dept_id {
            if &header.budget_dept_id != id {
                return false;
            }
        }
        if let Some(start) = p.period_start {
            if header.period_start < start {
                return false;
            }
        }
        if let Some(end) = p.period_end {
            if header.period_end > end {
                return false;
            }
        }
        if let Some(status) = p.status {
            if header.status != status {
                return false;
            }
        }
        if let Some(id) = &p.applicant_id {
            if &header.applicant_id != id {
                return false;
            }
        }
        if let Some(needle) = &p.title {
            if !header.title.contains(needle.as_str()) {
                return false;
            }
        }
        if !p.model_ids.is_empty()
            && !p.model_ids.iter().any(|id| header.model_ids.contains(id))
        {
            return false;
        }
        true
    }
}

/// Compares two headers by a named sort key.
///
/// String keys compare by Unicode code point (no locale tables in this core);
/// an unsupported key compares equal, leaving the existing order untouched.
fn compare_by_key(a: &RebateApplication, b: &RebateApplication, key: &str) -> Ordering {
    match key {
        "applicationNumber" => a.application_number.cmp(&b.application_number),
        "title" => a.title.cmp(&b.title),
        "applicantName" => a.applicant_name.cmp(&b.applicant_name),
        "status" => a.status.to_string().cmp(&b.status.to_string()),
        "periodStart" => a.period_start.cmp(&b.period_start),
        "periodEnd" => a.period_end.cmp(&b.period_end),
        "totalRebateAmount" => a.total_rebate_amount.cmp(&b.total_rebate_amount),
        "createdAt" => a.created_at.cmp(&b.created_at),
        "updatedAt" => a.updated_at.cmp(&b.updated_at),
        _ => Ordering::Equal,
    }
}

impl Query for SearchRebatesQuery {
    type Output = PaginatedResult<RebateWithRelations>;

    #[instrument(skip(self, store))]
    fn execute(&self, store: &RebateStore) -> Result<Self::Output, ServiceError> {
        debug!("Executing SearchRebatesQuery");
        let p = &self.params;
        let config = store.config();

        let mut matches: Vec<RebateApplication> = store.headers_snapshot();
        // Default order: ascending application number (insertion order).
        matches.sort_by(|a, b| a.application_number.cmp(&b.application_number));
        matches.retain(|header| self.matches(header));

        if let Some(key) = p.sort_by.as_deref() {
            let order = p.sort_order.unwrap_or_default();
            matches.sort_by(|a, b| {
                let ordering = compare_by_key(a, b, key);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let total = matches.len() as u64;
        let page_size = p
            .page_size
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);
        let page = p.page.unwrap_or(1).max(1);
        let total_pages = total.div_ceil(page_size);
        // An out-of-range page yields an empty slice, never an arithmetic
        // failure.
        let start = page.saturating_sub(1).saturating_mul(page_size) as usize;

        let data: Vec<RebateWithRelations> = matches
            .iter()
            .skip(start)
            .take(page_size as usize)
            .filter_map(|header| match hydrate_application(store, header) {
                Ok(row) => Some(row),
                Err(gap) => {
                    warn!(
                        header_id = %header.id,
                        application_number = %header.application_number,
                        %gap,
                        "Dropping search row with unresolved relations"
                    );
                    None
                }
            })
            .collect();

        Ok(PaginatedResult {
            data,
            total,
            page,
            page_size,
            total_pages,
        })
    }
}

/// Raw header lookup by id.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GetRebateQuery {
    pub id: Uuid,
}

impl Query for GetRebateQuery {
    type Output = Option<RebateApplication>;

    #[instrument(skip(self, store), fields(id = %self.id))]
    fn execute(&self, store: &RebateStore) -> Result<Self::Output, ServiceError> {
        debug!("Executing GetRebateQuery");
        Ok(store.get_header(self.id))
    }
}

/// Hydrated header lookup by id.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GetRebateWithRelationsQuery {
    pub id: Uuid,
}

impl Query for GetRebateWithRelationsQuery {
    type Output = RebateWithRelations;

    #[instrument(skip(self, store), fields(id = %self.id))]
    fn execute(&self, store: &RebateStore) -> Result<Self::Output, ServiceError> {
        debug!("Executing GetRebateWithRelationsQuery");
        let header = store.get_header(self.id).ok_or_else(|| {
            ServiceError::NotFound(format!("Rebate application {} not found", self.id))
        })?;
        hydrate_application(store, &header).map_err(|gap| {
            ServiceError::NotFound(format!("Rebate application {}: {}", self.id, gap))
        })
    }
}

/// Status counts over all headers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GetRebateStatsQuery;

impl Query for GetRebateStatsQuery {
    type Output = RebateStats;

    #[instrument(skip(self, store))]
    fn execute(&self, store: &RebateStore) -> Result<Self::Output, ServiceError> {
        debug!("Executing GetRebateStatsQuery");
        let mut stats = RebateStats::default();
        for header in store.headers_snapshot() {
            stats.total += 1;
            match header.status {
                RebateStatus::Draft => stats.draft += 1,
                RebateStatus::Pending => stats.pending += 1,
                RebateStatus::InReview => stats.in_review += 1,
                RebateStatus::Approved => stats.approved += 1,
                RebateStatus::Rejected => stats.rejected += 1,
                RebateStatus::Completed => stats.completed += 1,
            }
        }
        Ok(stats)
    }
}
