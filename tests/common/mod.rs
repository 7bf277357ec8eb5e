//! Shared seed fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use rebate_core::entities::reference::{
    ApplicationType, BigCategory, BudgetDept, Category, Corporation, MiddleCategory, PriceType,
    ProductModel, SalesDept,
};
use rebate_core::pricing::PricingMethod;
use rebate_core::seed::SeedData;
use rebate_core::services::rebates::{CreateRebateLineRequest, CreateRebateRequest};
use rebate_core::{RebateService, RebateStore, StoreConfig};

fn corporation(id: &str, name: &str, active: bool) -> Corporation {
    Corporation {
        id: id.to_string(),
        code: id.to_uppercase(),
        name: name.to_string(),
        description: None,
        is_active: active,
    }
}

fn big_category(id: &str, corporation_id: &str, name: &str) -> BigCategory {
    BigCategory {
        id: id.to_string(),
        code: id.to_uppercase(),
        name: name.to_string(),
        corporation_id: corporation_id.to_string(),
        description: None,
        is_active: true,
    }
}

fn middle_category(id: &str, big_category_id: &str, name: &str) -> MiddleCategory {
    MiddleCategory {
        id: id.to_string(),
        code: id.to_uppercase(),
        name: name.to_string(),
        big_category_id: big_category_id.to_string(),
        description: None,
        is_active: true,
    }
}

fn model(id: &str, chain: (&str, &str, &str), name: &str, active: bool) -> ProductModel {
    ProductModel {
        id: id.to_string(),
        code: id.to_uppercase(),
        name: name.to_string(),
        corporation_id: chain.0.to_string(),
        big_category_id: chain.1.to_string(),
        middle_category_id: chain.2.to_string(),
        description: None,
        is_active: active,
    }
}

/// Reference catalog used by most tests: two corporations with a full
/// hierarchy chain each, both pricing formulas, one of everything else.
pub fn seed() -> SeedData {
    SeedData {
        corporations: vec![
            corporation("corp-001", "Acme East", true),
            corporation("corp-002", "Acme West", true),
            corporation("corp-003", "Acme Legacy", false),
        ],
        categories: vec![Category {
            id: "cat-001".to_string(),
            code: "CAT1".to_string(),
            name: "Volume rebate".to_string(),
            description: None,
            is_active: true,
        }],
        sales_depts: vec![SalesDept {
            id: "sd-001".to_string(),
            code: "SD1".to_string(),
            name: "Domestic sales".to_string(),
            description: None,
            is_active: true,
        }],
        budget_depts: vec![BudgetDept {
            id: "bd-001".to_string(),
            code: "BD1".to_string(),
            name: "Trade budget".to_string(),
            description: None,
            is_active: true,
        }],
        price_types: vec![PriceType {
            id: "pt-001".to_string(),
            code: "PT1".to_string(),
            name: "List price".to_string(),
            description: None,
            is_active: true,
        }],
        application_types: vec![
            ApplicationType {
                id: "app-001".to_string(),
                code: "UNIT".to_string(),
                name: "Unit incentive".to_string(),
                description: None,
                pricing_method: PricingMethod::UnitIncentive,
                is_active: true,
            },
            ApplicationType {
                id: "app-002".to_string(),
                code: "RATE".to_string(),
                name: "Rate incentive".to_string(),
                description: None,
                pricing_method: PricingMethod::RateIncentive,
                is_active: true,
            },
        ],
        big_categories: vec![
            big_category("bc-001", "corp-001", "Appliances"),
            big_category("bc-002", "corp-002", "Electronics"),
        ],
        middle_categories: vec![
            middle_category("mc-001", "bc-001", "Refrigerators"),
            middle_category("mc-002", "bc-002", "Televisions"),
        ],
        models: vec![
            model("m-001", ("corp-001", "bc-001", "mc-001"), "Model One", true),
            model("m-002", ("corp-001", "bc-001", "mc-001"), "Model Two", true),
            model("m-003", ("corp-002", "bc-002", "mc-002"), "Model Three", true),
            model("m-004", ("corp-001", "bc-001", "mc-001"), "Model Four", false),
        ],
        ..SeedData::default()
    }
}

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn store() -> Arc<RebateStore> {
    init_tracing();
    RebateStore::from_seed(StoreConfig::default(), seed())
}

pub fn service() -> (RebateService, Arc<RebateStore>) {
    let store = store();
    (RebateService::new(store.clone()), store)
}

/// Unit-incentive line on the corp-001 hierarchy chain.
pub fn unit_line(model_id: &str, rebate_price: Decimal, quantity: i32) -> CreateRebateLineRequest {
    CreateRebateLineRequest {
        application_type_id: "app-001".to_string(),
        big_category_id: "bc-001".to_string(),
        middle_category_id: "mc-001".to_string(),
        model_id: model_id.to_string(),
        price_type_id: "pt-001".to_string(),
        price: Decimal::from(100),
        quantity,
        rebate_price: Some(rebate_price),
        rebate_rate: None,
    }
}

/// Rate-incentive line on the corp-001 hierarchy chain.
pub fn rate_line(
    model_id: &str,
    price: Decimal,
    quantity: i32,
    rebate_rate: Decimal,
) -> CreateRebateLineRequest {
    CreateRebateLineRequest {
        application_type_id: "app-002".to_string(),
        big_category_id: "bc-001".to_string(),
        middle_category_id: "mc-001".to_string(),
        model_id: model_id.to_string(),
        price_type_id: "pt-001".to_string(),
        price,
        quantity,
        rebate_price: None,
        rebate_rate: Some(rebate_rate),
    }
}

pub fn create_request(title: &str, lines: Vec<CreateRebateLineRequest>) -> CreateRebateRequest {
    CreateRebateRequest {
        corporation_id: "corp-001".to_string(),
        category_id: "cat-001".to_string(),
        sales_dept_id: "sd-001".to_string(),
        budget_dept_id: "bd-001".to_string(),
        title: title.to_string(),
        description: None,
        comment: None,
        period_start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        period_end: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        status: None,
        applicant_id: Some("user-001".to_string()),
        applicant_name: Some("Test Applicant".to_string()),
        lines,
    }
}
