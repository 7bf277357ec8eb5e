//! Rebate application service: master-detail create/update/delete with
//! always-consistent aggregates.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::rebate::{
    RebateApplication, RebateLine, RebateStats, RebateStatus, RebateWithRelations,
};
use crate::errors::ServiceError;
use crate::pricing::compute_line_amount;
use crate::queries::rebate_queries::{
    GetRebateStatsQuery, RebateSearchParams, SearchRebatesQuery,
};
use crate::queries::{hydrate_application, Query};
use crate::store::RebateStore;
use crate::PaginatedResult;

/// One embedded line of a create request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRebateLineRequest {
    #[validate(length(min = 1, message = "applicationTypeId is required"))]
    pub application_type_id: String,
    #[validate(length(min = 1, message = "bigCategoryId is required"))]
    pub big_category_id: String,
    #[validate(length(min = 1, message = "middleCategoryId is required"))]
    pub middle_category_id: String,
    #[validate(length(min = 1, message = "modelId is required"))]
    pub model_id: String,
    #[validate(length(min = 1, message = "priceTypeId is required"))]
    pub price_type_id: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub rebate_price: Option<Decimal>,
    #[serde(default)]
    pub rebate_rate: Option<Decimal>,
}

/// Partial line update; `None` fields are left unchanged. Changing the
/// application type clears the previous formula's operands before the
/// remaining fields merge, so a stale incentive value cannot leak into the
/// new formula.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRebateLineRequest {
    pub application_type_id: Option<String>,
    pub big_category_id: Option<String>,
    pub middle_category_id: Option<String>,
    pub model_id: Option<String>,
    pub price_type_id: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub rebate_price: Option<Decimal>,
    pub rebate_rate: Option<Decimal>,
}

/// One instruction of an ordered batch over a header's lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LineOperation {
    Create {
        #[serde(flatten)]
        line: CreateRebateLineRequest,
    },
    Update {
        id: Uuid,
        #[serde(flatten)]
        changes: UpdateRebateLineRequest,
    },
    Delete {
        id: Uuid,
    },
}

/// Header creation request with embedded lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRebateRequest {
    #[validate(length(min = 1, message = "corporationId is required"))]
    pub corporation_id: String,
    #[validate(length(min = 1, message = "categoryId is required"))]
    pub category_id: String,
    #[validate(length(min = 1, message = "salesDeptId is required"))]
    pub sales_dept_id: String,
    #[validate(length(min = 1, message = "budgetDeptId is required"))]
    pub budget_dept_id: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub status: Option<RebateStatus>,
    #[serde(default)]
    pub applicant_id: Option<String>,
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[validate]
    #[serde(default)]
    pub lines: Vec<CreateRebateLineRequest>,
}

/// Combined header update plus an ordered batch of line operations.
///
/// Derived header fields have no members here, so a caller cannot set them —
/// they are recomputed from the lines after the batch runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRebateRequest {
    pub id: Uuid,
    #[serde(default)]
    pub corporation_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub sales_dept_id: Option<String>,
    #[serde(default)]
    pub budget_dept_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<RebateStatus>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lines: Vec<LineOperation>,
}

/// Service for managing rebate applications over the in-memory store.
#[derive(Clone)]
pub struct RebateService {
    store: Arc<RebateStore>,
}

impl RebateService {
    pub fn new(store: Arc<RebateStore>) -> Self {
        Self { store }
    }

    /// Creates a header and its embedded lines.
    ///
    /// The header and every line are validated before anything is persisted:
    /// a single bad line fails the whole call with no partial state.
    #[instrument(skip(self, request), fields(title = %request.title, lines = request.lines.len()))]
    pub fn create_rebate(
        &self,
        request: CreateRebateRequest,
    ) -> Result<RebateWithRelations, ServiceError> {
        request.validate().map_err(ServiceError::from)?;
        self.check_period(request.period_start, request.period_end)?;
        self.check_header_references(
            Some(&request.corporation_id),
            Some(&request.category_id),
            Some(&request.sales_dept_id),
            Some(&request.budget_dept_id),
        )?;
        for line in &request.lines {
            self.validate_line(line)?;
        }

        let now = Utc::now();
        let config = self.store.config();
        let header = RebateApplication {
            id: Uuid::new_v4(),
            application_number: self.store.next_application_number(),
            corporation_id: request.corporation_id,
            category_id: request.category_id,
            sales_dept_id: request.sales_dept_id,
            budget_dept_id: request.budget_dept_id,
            title: request.title,
            description: request.description,
            comment: request.comment,
            period_start: request.period_start,
            period_end: request.period_end,
            status: request.status.unwrap_or_default(),
            applicant_id: request
                .applicant_id
                .unwrap_or_else(|| config.default_applicant_id.clone()),
            applicant_name: request
                .applicant_name
                .unwrap_or_else(|| config.default_applicant_name.clone()),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
            total_rebate_amount: Decimal::ZERO,
            model_ids: Vec::new(),
            model_names: String::new(),
        };
        let header_id = header.id;
        let application_number = header.application_number.clone();
        self.store.insert_header(header);

        for line in request.lines {
            self.create_line(header_id, line)?;
        }
        self.store.recompute_aggregates(header_id);

        info!(%header_id, %application_number, "Rebate application created");
        self.hydrated(header_id)
    }

    /// Creates a single line under an existing header and recomputes the
    /// header's aggregates.
    #[instrument(skip(self, request), fields(%header_id))]
    pub fn create_line(
        &self,
        header_id: Uuid,
        request: CreateRebateLineRequest,
    ) -> Result<RebateLine, ServiceError> {
        if !self.store.contains_header(header_id) {
            return Err(ServiceError::NotFound(format!(
                "Rebate application {} not found",
                header_id
            )));
        }
        self.validate_line(&request)?;

        let now = Utc::now();
        let method = self.store.pricing_method_for(&request.application_type_id);
        let amount = compute_line_amount(
            method,
            request.price,
            request.quantity,
            request.rebate_price,
            request.rebate_rate,
        );
        let line = RebateLine {
            id: Uuid::new_v4(),
            rebate_application_id: header_id,
            application_type_id: request.application_type_id,
            big_category_id: request.big_category_id,
            middle_category_id: request.middle_category_id,
            model_id: request.model_id,
            price_type_id: request.price_type_id,
            price: request.price,
            quantity: request.quantity,
            rebate_price: request.rebate_price,
            rebate_rate: request.rebate_rate,
            item_rebate_amount: amount,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_line(line.clone());
        self.store.recompute_aggregates(header_id);
        Ok(line)
    }

    /// Merges partial fields into a line, recomputes its amount, and
    /// recomputes the owning header's aggregates.
    #[instrument(skip(self, changes), fields(%line_id))]
    pub fn update_line(
        &self,
        line_id: Uuid,
        changes: UpdateRebateLineRequest,
    ) -> Result<RebateLine, ServiceError> {
        let mut line = self.store.get_line(line_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Rebate line {} not found", line_id))
        })?;

        if let Some(id) = changes.application_type_id {
            if id != line.application_type_id {
                // Formula switch: the previous formula's operands do not
                // carry over.
                line.rebate_price = None;
                line.rebate_rate = None;
            }
            line.application_type_id = id;
        }
        if let Some(id) = changes.big_category_id {
            line.big_category_id = id;
        }
        if let Some(id) = changes.middle_category_id {
            line.middle_category_id = id;
        }
        if let Some(id) = changes.model_id {
            line.model_id = id;
        }
        if let Some(id) = changes.price_type_id {
            line.price_type_id = id;
        }
        if let Some(price) = changes.price {
            line.price = price;
        }
        if let Some(quantity) = changes.quantity {
            line.quantity = quantity;
        }
        if let Some(rebate_price) = changes.rebate_price {
            line.rebate_price = Some(rebate_price);
        }
        if let Some(rebate_rate) = changes.rebate_rate {
            line.rebate_rate = Some(rebate_rate);
        }

        self.check_line_domain(
            line.price,
            line.quantity,
            line.rebate_price,
            line.rebate_rate,
        )?;
        self.check_line_references(
            &line.big_category_id,
            &line.middle_category_id,
            &line.model_id,
            &line.price_type_id,
        )?;

        let method = self.store.pricing_method_for(&line.application_type_id);
        line.item_rebate_amount = compute_line_amount(
            method,
            line.price,
            line.quantity,
            line.rebate_price,
            line.rebate_rate,
        );
        line.updated_at = Utc::now();

        self.store.replace_line(line.clone());
        self.store.recompute_aggregates(line.rebate_application_id);
        Ok(line)
    }

    /// Removes a line and recomputes the owning header. Returns `false` when
    /// the line did not exist.
    #[instrument(skip(self), fields(%line_id))]
    pub fn delete_line(&self, line_id: Uuid) -> bool {
        match self.store.remove_line(line_id) {
            Some(line) => {
                self.store.recompute_aggregates(line.rebate_application_id);
                true
            }
            None => false,
        }
    }

    /// Applies an ordered batch of line operations against one header.
    ///
    /// Each instruction goes through the single-line operations above, so
    /// every step individually maintains the header invariants. Malformed
    /// entries — failed validation, unknown ids, lines owned by another
    /// header — are skipped with a warning rather than aborting the batch.
    /// Returns the number of applied instructions.
    #[instrument(skip(self, operations), fields(%header_id, operations = operations.len()))]
    pub fn apply_line_operations(
        &self,
        header_id: Uuid,
        operations: Vec<LineOperation>,
    ) -> Result<usize, ServiceError> {
        if !self.store.contains_header(header_id) {
            return Err(ServiceError::NotFound(format!(
                "Rebate application {} not found",
                header_id
            )));
        }

        let mut applied = 0;
        for operation in operations {
            match operation {
                LineOperation::Create { line } => match self.create_line(header_id, line) {
                    Ok(_) => applied += 1,
                    Err(e) => warn!(%header_id, error = %e, "Skipping malformed create in batch"),
                },
                LineOperation::Update { id, changes } => {
                    if !self.line_belongs_to(id, header_id) {
                        warn!(%header_id, line_id = %id, "Skipping update in batch: line not owned by header");
                        continue;
                    }
                    match self.update_line(id, changes) {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            warn!(%header_id, line_id = %id, error = %e, "Skipping malformed update in batch")
                        }
                    }
                }
                LineOperation::Delete { id } => {
                    if !self.line_belongs_to(id, header_id) {
                        warn!(%header_id, line_id = %id, "Skipping delete in batch: line not owned by header");
                        continue;
                    }
                    if self.delete_line(id) {
                        applied += 1;
                    }
                }
            }
        }
        Ok(applied)
    }

    /// Applies header field updates, then runs the embedded line batch.
    #[instrument(skip(self, request), fields(header_id = %request.id))]
    pub fn update_rebate(
        &self,
        request: UpdateRebateRequest,
    ) -> Result<RebateWithRelations, ServiceError> {
        let mut header = self.store.get_header(request.id).ok_or_else(|| {
            ServiceError::NotFound(format!("Rebate application {} not found", request.id))
        })?;

        self.check_header_references(
            request.corporation_id.as_deref(),
            request.category_id.as_deref(),
            request.sales_dept_id.as_deref(),
            request.budget_dept_id.as_deref(),
        )?;

        if let Some(id) = request.corporation_id {
            header.corporation_id = id;
        }
        if let Some(id) = request.category_id {
            header.category_id = id;
        }
        if let Some(id) = request.sales_dept_id {
            header.sales_dept_id = id;
        }
        if let Some(id) = request.budget_dept_id {
            header.budget_dept_id = id;
        }
        if let Some(title) = request.title {
            if title.is_empty() {
                return Err(ServiceError::ValidationError(
                    "title must not be empty".to_string(),
                ));
            }
            header.title = title;
        }
        if let Some(description) = request.description {
            header.description = Some(description);
        }
        if let Some(comment) = request.comment {
            header.comment = Some(comment);
        }
        if let Some(start) = request.period_start {
            header.period_start = start;
        }
        if let Some(end) = request.period_end {
            header.period_end = end;
        }
        self.check_period(header.period_start, header.period_end)?;
        if let Some(status) = request.status {
            // Plain field update, no transition table.
            header.status = status;
        }
        if let Some(approved_by) = request.approved_by {
            header.approved_by = Some(approved_by);
        }
        if let Some(approved_at) = request.approved_at {
            header.approved_at = Some(approved_at);
        }
        header.updated_at = Utc::now();

        let header_id = header.id;
        self.store.replace_header(header);

        self.apply_line_operations(header_id, request.lines)?;
        self.store.recompute_aggregates(header_id);

        info!(%header_id, "Rebate application updated");
        self.hydrated(header_id)
    }

    /// Removes a header and all of its lines. Returns `false` when the id
    /// was unknown.
    #[instrument(skip(self), fields(%header_id))]
    pub fn delete_rebate(&self, header_id: Uuid) -> bool {
        let removed = self.store.remove_header(header_id);
        if removed {
            info!(%header_id, "Rebate application deleted");
        }
        removed
    }

    /// Raw header lookup. Unaffected by hydration gaps — a header with a
    /// dangling reference is still returned here.
    pub fn get_rebate(&self, header_id: Uuid) -> Option<RebateApplication> {
        self.store.get_header(header_id)
    }

    /// Hydrated header lookup.
    pub fn get_rebate_with_relations(
        &self,
        header_id: Uuid,
    ) -> Result<RebateWithRelations, ServiceError> {
        self.hydrated(header_id)
    }

    /// Filtered, sorted, paginated, hydrated search.
    pub fn search(
        &self,
        params: RebateSearchParams,
    ) -> Result<PaginatedResult<RebateWithRelations>, ServiceError> {
        SearchRebatesQuery { params }.execute(&self.store)
    }

    /// Status counts over all headers, recomputed on demand.
    pub fn get_rebate_stats(&self) -> RebateStats {
        GetRebateStatsQuery
            .execute(&self.store)
            .unwrap_or_default()
    }

    // Validation helpers

    fn validate_line(&self, request: &CreateRebateLineRequest) -> Result<(), ServiceError> {
        request.validate().map_err(ServiceError::from)?;
        self.check_line_domain(
            request.price,
            request.quantity,
            request.rebate_price,
            request.rebate_rate,
        )?;
        self.check_line_references(
            &request.big_category_id,
            &request.middle_category_id,
            &request.model_id,
            &request.price_type_id,
        )
    }

    fn check_line_domain(
        &self,
        price: Decimal,
        quantity: i32,
        rebate_price: Option<Decimal>,
        rebate_rate: Option<Decimal>,
    ) -> Result<(), ServiceError> {
        if price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity must not be negative".to_string(),
            ));
        }
        if let Some(rebate_price) = rebate_price {
            if rebate_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "rebatePrice must not be negative".to_string(),
                ));
            }
        }
        if let Some(rate) = rebate_rate {
            // Fraction, not a percentage: 5% is 0.05.
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ServiceError::ValidationError(
                    "rebateRate must be a fraction between 0 and 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Line references must resolve at write time; the application type is
    /// exempt — an unknown one degrades to a zero amount by design.
    fn check_line_references(
        &self,
        big_category_id: &str,
        middle_category_id: &str,
        model_id: &str,
        price_type_id: &str,
    ) -> Result<(), ServiceError> {
        let catalog = self.store.catalog();
        if catalog.big_category_by_id(big_category_id).is_none() {
            return Err(ServiceError::ValidationError(format!(
                "unknown bigCategoryId {}",
                big_category_id
            )));
        }
        if catalog.middle_category_by_id(middle_category_id).is_none() {
            return Err(ServiceError::ValidationError(format!(
                "unknown middleCategoryId {}",
                middle_category_id
            )));
        }
        if catalog.model_by_id(model_id).is_none() {
            return Err(ServiceError::ValidationError(format!(
                "unknown modelId {}",
                model_id
            )));
        }
        if catalog.price_type_by_id(price_type_id).is_none() {
            return Err(ServiceError::ValidationError(format!(
                "unknown priceTypeId {}",
                price_type_id
            )));
        }
        Ok(())
    }

    fn check_header_references(
        &self,
        corporation_id: Option<&str>,
        category_id: Option<&str>,
        sales_dept_id: Option<&str>,
        budget_dept_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let catalog = self.store.catalog();
        if let Some(id) = corporation_id {
            if catalog.corporation_by_id(id).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown corporationId {}",
                    id
                )));
            }
        }
        if let Some(id) = category_id {
            if catalog.category_by_id(id).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown categoryId {}",
                    id
                )));
            }
        }
        if let Some(id) = sales_dept_id {
            if catalog.sales_dept_by_id(id).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown salesDeptId {}",
                    id
                )));
            }
        }
        if let Some(id) = budget_dept_id {
            if catalog.budget_dept_by_id(id).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown budgetDeptId {}",
                    id
                )));
            }
        }
        Ok(())
    }

    fn check_period(&self, start: NaiveDate, end: NaiveDate) -> Result<(), ServiceError> {
        if end < start {
            return Err(ServiceError::ValidationError(
                "periodEnd must not precede periodStart".to_string(),
            ));
        }
        Ok(())
    }

    fn line_belongs_to(&self, line_id: Uuid, header_id: Uuid) -> bool {
        self.store
            .get_line(line_id)
            .map_or(false, |l| l.rebate_application_id == header_id)
    }

    fn hydrated(&self, header_id: Uuid) -> Result<RebateWithRelations, ServiceError> {
        let header = self.store.get_header(header_id).ok_or_else(|| {
            ServiceError::NotFound(format!("Rebate application {} not found", header_id))
        })?;
        hydrate_application(&self.store, &header)
            .map_err(|gap| ServiceError::NotFound(format!("Rebate application {}: {}", header_id, gap)))
    }
}
