//! Startup seed data.
//!
//! One record list per entity kind, supplied at store construction. How the
//! lists are produced (JSON files, fixtures, a remote dump) is the host's
//! concern; this crate only consumes the deserialized shape.

use serde::{Deserialize, Serialize};

use crate::entities::rebate::{RebateApplication, RebateLine};
use crate::entities::reference::{
    ApplicationType, BigCategory, BudgetDept, Category, Corporation, MiddleCategory, PriceType,
    ProductModel, SalesDept,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedData {
    pub corporations: Vec<Corporation>,
    pub categories: Vec<Category>,
    pub sales_depts: Vec<SalesDept>,
    pub budget_depts: Vec<BudgetDept>,
    pub price_types: Vec<PriceType>,
    pub application_types: Vec<ApplicationType>,
    pub big_categories: Vec<BigCategory>,
    pub middle_categories: Vec<MiddleCategory>,
    pub models: Vec<ProductModel>,
    /// Pre-existing headers. Their derived fields are recomputed on load.
    pub rebates: Vec<RebateApplication>,
    /// Pre-existing lines. Orphans (unknown header id) are skipped on load.
    pub rebate_lines: Vec<RebateLine>,
}
