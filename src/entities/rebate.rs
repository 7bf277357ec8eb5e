//! Rebate application records: the master header, its owned lines, and the
//! hydrated views returned to callers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::reference::{
    ApplicationType, BigCategory, BudgetDept, Category, Corporation, MiddleCategory, PriceType,
    ProductModel, SalesDept,
};

/// Lifecycle status of a rebate application.
///
/// Transitions are intentionally permissive: any status is accepted as a plain
/// field update, there is no enforced state machine.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RebateStatus {
    #[default]
    Draft,
    Pending,
    InReview,
    Approved,
    Rejected,
    Completed,
}

impl RebateStatus {
    /// Human display text.
    pub fn label(&self) -> &'static str {
        match self {
            RebateStatus::Draft => "Draft",
            RebateStatus::Pending => "Pending review",
            RebateStatus::InReview => "In review",
            RebateStatus::Approved => "Approved",
            RebateStatus::Rejected => "Rejected",
            RebateStatus::Completed => "Completed",
        }
    }
}

/// Master rebate-application record.
///
/// `total_rebate_amount`, `model_ids` and `model_names` are derived from the
/// live lines and never set by a caller; they are rewritten by the store's
/// aggregate recomputation after every line mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateApplication {
    pub id: Uuid,
    /// Unique, strictly increasing in insertion order (`{prefix}{YYYYMM}{seq}`).
    pub application_number: String,
    pub corporation_id: String,
    pub category_id: String,
    pub sales_dept_id: String,
    pub budget_dept_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: RebateStatus,
    pub applicant_id: String,
    pub applicant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived: sum of `item_rebate_amount` over the current lines.
    pub total_rebate_amount: Decimal,
    /// Derived: deduplicated model ids over the current lines.
    pub model_ids: Vec<String>,
    /// Derived: `;`-joined display names of `model_ids`.
    pub model_names: String,
}

/// Detail record owned by a header, one priced claim entry.
///
/// Depending on the application type exactly one of `rebate_price` (unit
/// incentive) or `rebate_rate` (fractional incentive) is expected to carry a
/// value; `item_rebate_amount` is derived by the calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateLine {
    pub id: Uuid,
    pub rebate_application_id: Uuid,
    pub application_type_id: String,
    pub big_category_id: String,
    pub middle_category_id: String,
    pub model_id: String,
    pub price_type_id: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebate_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebate_rate: Option<Decimal>,
    pub item_rebate_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line expanded with its full reference-entity graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateLineWithRelations {
    #[serde(flatten)]
    pub line: RebateLine,
    pub application_type: ApplicationType,
    pub big_category: BigCategory,
    pub middle_category: MiddleCategory,
    pub model: ProductModel,
    pub price_type: PriceType,
}

/// A header expanded with its reference entities and hydrated line list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateWithRelations {
    #[serde(flatten)]
    pub application: RebateApplication,
    pub corporation: Corporation,
    pub category: Category,
    pub sales_dept: SalesDept,
    pub budget_dept: BudgetDept,
    pub lines: Vec<RebateLineWithRelations>,
}

/// Read-only aggregate counted over all headers by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebateStats {
    pub total: u64,
    pub draft: u64,
    pub pending: u64,
    pub in_review: u64,
    pub approved: u64,
    pub rejected: u64,
    pub completed: u64,
}
