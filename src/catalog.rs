//! Read-only reference catalog.
//!
//! Lookup entities and the 3-level product hierarchy, seeded once at store
//! construction. Lookups return `Option` so callers can distinguish an empty
//! filter result from a broken reference; scoping by a parent with no
//! children yields an empty list, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::reference::{
    ApplicationType, BigCategory, BudgetDept, Category, Corporation, MiddleCategory, PriceType,
    ProductModel, SalesDept,
};
use crate::seed::SeedData;

/// Scoping filter for big-category listings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BigCategoryFilter {
    pub corporation_id: Option<String>,
    pub active: Option<bool>,
}

/// Scoping filter for middle-category listings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiddleCategoryFilter {
    pub big_category_id: Option<String>,
    pub active: Option<bool>,
}

/// Scoping filter for model listings; any subset of the three ancestors.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelFilter {
    pub corporation_id: Option<String>,
    pub big_category_id: Option<String>,
    pub middle_category_id: Option<String>,
    pub active: Option<bool>,
}

/// Static lookup data, immutable after construction.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    corporations: Vec<Corporation>,
    categories: Vec<Category>,
    sales_depts: Vec<SalesDept>,
    budget_depts: Vec<BudgetDept>,
    price_types: Vec<PriceType>,
    application_types: Vec<ApplicationType>,
    big_categories: Vec<BigCategory>,
    middle_categories: Vec<MiddleCategory>,
    models: Vec<ProductModel>,
}

fn matches_active(active: Option<bool>, is_active: bool) -> bool {
    active.map_or(true, |wanted| is_active == wanted)
}

impl Catalog {
    pub fn from_seed(seed: &SeedData) -> Self {
        debug!(
            corporations = seed.corporations.len(),
            models = seed.models.len(),
            "Building reference catalog from seed"
        );
        Self {
            corporations: seed.corporations.clone(),
            categories: seed.categories.clone(),
            sales_depts: seed.sales_depts.clone(),
            budget_depts: seed.budget_depts.clone(),
            price_types: seed.price_types.clone(),
            application_types: seed.application_types.clone(),
            big_categories: seed.big_categories.clone(),
            middle_categories: seed.middle_categories.clone(),
            models: seed.models.clone(),
        }
    }

    // Flat listings, optionally filtered by the active flag.

    pub fn corporations(&self, active: Option<bool>) -> Vec<Corporation> {
        self.corporations
            .iter()
            .filter(|c| matches_active(active, c.is_active))
            .cloned()
            .collect()
    }

    pub fn categories(&self, active: Option<bool>) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| matches_active(active, c.is_active))
            .cloned()
            .collect()
    }

    pub fn sales_depts(&self, active: Option<bool>) -> Vec<SalesDept> {
        self.sales_depts
            .iter()
            .filter(|d| matches_active(active, d.is_active))
            .cloned()
            .collect()
    }

    pub fn budget_depts(&self, active: Option<bool>) -> Vec<BudgetDept> {
        self.budget_depts
            .iter()
            .filter(|d| matches_active(active, d.is_active))
            .cloned()
            .collect()
    }

    pub fn price_types(&self, active: Option<bool>) -> Vec<PriceType> {
        self.price_types
            .iter()
            .filter(|t| matches_active(active, t.is_active))
            .cloned()
            .collect()
    }

    pub fn application_types(&self, active: Option<bool>) -> Vec<ApplicationType> {
        self.application_types
            .iter()
            .filter(|t| matches_active(active, t.is_active))
            .cloned()
            .collect()
    }

    // Hierarchy listings, scoped by parent keys.

    pub fn big_categories(&self, filter: &BigCategoryFilter) -> Vec<BigCategory> {
        self.big_categories
            .iter()
            .filter(|c| {
                filter
                    .corporation_id
                    .as_ref()
                    .map_or(true, |id| &c.corporation_id == id)
            })
            .filter(|c| matches_active(filter.active, c.is_active))
            .cloned()
            .collect()
    }

    pub fn middle_categories(&self, filter: &MiddleCategoryFilter) -> Vec<MiddleCategory> {
        self.middle_categories
            .iter()
            .filter(|c| {
                filter
                    .big_category_id
                    .as_ref()
                    .map_or(true, |id| &c.big_category_id == id)
            })
            .filter(|c| matches_active(filter.active, c.is_active))
            .cloned()
            .collect()
    }

    pub fn models(&self, filter: &ModelFilter) -> Vec<ProductModel> {
        self.models
            .iter()
            .filter(|m| {
                filter
                    .corporation_id
                    .as_ref()
                    .map_or(true, |id| &m.corporation_id == id)
            })
            .filter(|m| {
                filter
                    .big_category_id
                    .as_ref()
                    .map_or(true, |id| &m.big_category_id == id)
            })
            .filter(|m| {
                filter
                    .middle_category_id
                    .as_ref()
                    .map_or(true, |id| &m.middle_category_id == id)
            })
            .filter(|m| matches_active(filter.active, m.is_active))
            .cloned()
            .collect()
    }

    // Lookups by id. Absent ids are a sentinel `None`, not an error.

    pub fn corporation_by_id(&self, id: &str) -> Option<&Corporation> {
        self.corporations.iter().find(|c| c.id == id)
    }

    pub fn category_by_id(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn sales_dept_by_id(&self, id: &str) -> Option<&SalesDept> {
        self.sales_depts.iter().find(|d| d.id == id)
    }

    pub fn budget_dept_by_id(&self, id: &str) -> Option<&BudgetDept> {
        self.budget_depts.iter().find(|d| d.id == id)
    }

    pub fn price_type_by_id(&self, id: &str) -> Option<&PriceType> {
        self.price_types.iter().find(|t| t.id == id)
    }

    pub fn application_type_by_id(&self, id: &str) -> Option<&ApplicationType> {
        self.application_types.iter().find(|t| t.id == id)
    }

    pub fn big_category_by_id(&self, id: &str) -> Option<&BigCategory> {
        self.big_categories.iter().find(|c| c.id == id)
    }

    pub fn middle_category_by_id(&self, id: &str) -> Option<&MiddleCategory> {
        self.middle_categories.iter().find(|c| c.id == id)
    }

    pub fn model_by_id(&self, id: &str) -> Option<&ProductModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Resolves a set of model ids, keeping only the rows that exist.
    pub fn models_by_ids(&self, ids: &[String]) -> Vec<ProductModel> {
        if ids.is_empty() {
            return Vec::new();
        }
        self.models
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect()
    }
}
