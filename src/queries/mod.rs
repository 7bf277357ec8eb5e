//! Read-side query objects over the rebate store.

pub mod rebate_queries;

pub use rebate_queries::{
    GetRebateQuery, GetRebateStatsQuery, GetRebateWithRelationsQuery, RebateSearchParams,
    SearchRebatesQuery, SortOrder,
};

use tracing::warn;

use crate::entities::rebate::{RebateApplication, RebateWithRelations};
use crate::errors::ServiceError;
use crate::store::RebateStore;

/// A synchronous query executed against the store.
pub trait Query {
    type Output;

    fn execute(&self, store: &RebateStore) -> Result<Self::Output, ServiceError>;
}

/// Expands a header into its full reference-entity graph plus hydrated lines.
///
/// `Err` names the first missing relation; the caller decides whether that is
/// a dropped row (search) or a not-found (direct lookup).
pub(crate) fn hydrate_application(
    store: &RebateStore,
    header: &RebateApplication,
) -> Result<RebateWithRelations, String> {
    let catalog = store.catalog();

    let corporation = catalog
        .corporation_by_id(&header.corporation_id)
        .cloned()
        .ok_or_else(|| format!("corporation {} not found", header.corporation_id))?;
    let category = catalog
        .category_by_id(&header.category_id)
        .cloned()
        .ok_or_else(|| format!("category {} not found", header.category_id))?;
    let sales_dept = catalog
        .sales_dept_by_id(&header.sales_dept_id)
        .cloned()
        .ok_or_else(|| format!("sales dept {} not found", header.sales_dept_id))?;
    let budget_dept = catalog
        .budget_dept_by_id(&header.budget_dept_id)
        .cloned()
        .ok_or_else(|| format!("budget dept {} not found", header.budget_dept_id))?;

    let mut lines = Vec::new();
    for line in store.lines_for_header(header.id) {
        let application_type = catalog
            .application_type_by_id(&line.application_type_id)
            .cloned()
            .ok_or_else(|| format!("application type {} not found", line.application_type_id))?;
        let big_category = catalog
            .big_category_by_id(&line.big_category_id)
            .cloned()
            .ok_or_else(|| format!("big category {} not found", line.big_category_id))?;
        let middle_category = catalog
            .middle_category_by_id(&line.middle_category_id)
            .cloned()
            .ok_or_else(|| format!("middle category {} not found", line.middle_category_id))?;
        let model = catalog
            .model_by_id(&line.model_id)
            .cloned()
            .ok_or_else(|| format!("model {} not found", line.model_id))?;
        let price_type = catalog
            .price_type_by_id(&line.price_type_id)
            .cloned()
            .ok_or_else(|| format!("price type {} not found", line.price_type_id))?;

        lines.push(crate::entities::rebate::RebateLineWithRelations {
            line,
            application_type,
            big_category,
            middle_category,
            model,
            price_type,
        });
    }

    if header.model_ids.len() != catalog.models_by_ids(&header.model_ids).len() {
        warn!(
            header_id = %header.id,
            "Some aggregated model ids are unresolved in the catalog"
        );
    }

    Ok(RebateWithRelations {
        application: header.clone(),
        corporation,
        category,
        sales_dept,
        budget_dept,
        lines,
    })
}
