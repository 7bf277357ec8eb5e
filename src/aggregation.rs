//! Derived-field recomputation.
//!
//! Single entry point for rewriting a header's aggregates from its live
//! lines. Every line mutation path, including batch operations, funnels
//! through here so header and line data cannot drift. Not part of the public
//! API — callers observe aggregates, they never trigger recomputation.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;
use uuid::Uuid;

use crate::store::RebateStore;

impl RebateStore {
    /// Rewrites `total_rebate_amount`, `model_ids` and `model_names` on the
    /// header from its current lines. Idempotent: with no intervening line
    /// mutation a second call writes identical values.
    pub(crate) fn recompute_aggregates(&self, header_id: Uuid) {
        let lines = self.lines_for_header(header_id);

        let total = lines
            .iter()
            .map(|l| l.item_rebate_amount)
            .sum::<Decimal>()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let mut model_ids: Vec<String> = Vec::new();
        for line in &lines {
            if !model_ids.contains(&line.model_id) {
                model_ids.push(line.model_id.clone());
            }
        }

        let model_names = model_ids
            .iter()
            .map(|id| match self.catalog().model_by_id(id) {
                Some(model) => model.name.clone(),
                None => {
                    warn!(%header_id, model_id = %id, "Model name unresolved, keeping raw id");
                    id.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(";");

        if let Some(mut header) = self.header_entry_mut(header_id) {
            header.total_rebate_amount = total;
            header.model_ids = model_ids;
            header.model_names = model_names;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::config::StoreConfig;
    use crate::entities::rebate::{RebateApplication, RebateLine, RebateStatus};
    use crate::entities::reference::{ApplicationType, ProductModel};
    use crate::pricing::PricingMethod;
    use crate::seed::SeedData;
    use crate::store::RebateStore;

    fn store_with_models() -> Arc<RebateStore> {
        let seed = SeedData {
            application_types: vec![ApplicationType {
                id: "app-001".to_string(),
                code: "UNIT".to_string(),
                name: "Unit incentive".to_string(),
                description: None,
                pricing_method: PricingMethod::UnitIncentive,
                is_active: true,
            }],
            models: vec![
                ProductModel {
                    id: "m-001".to_string(),
                    code: "M1".to_string(),
                    name: "Model One".to_string(),
                    corporation_id: "corp-001".to_string(),
                    big_category_id: "bc-001".to_string(),
                    middle_category_id: "mc-001".to_string(),
                    description: None,
                    is_active: true,
                },
                ProductModel {
                    id: "m-002".to_string(),
                    code: "M2".to_string(),
                    name: "Model Two".to_string(),
                    corporation_id: "corp-001".to_string(),
                    big_category_id: "bc-001".to_string(),
                    middle_category_id: "mc-001".to_string(),
                    description: None,
                    is_active: true,
                },
            ],
            ..SeedData::default()
        };
        RebateStore::from_seed(StoreConfig::default(), seed)
    }

    fn header(store: &RebateStore) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        store.insert_header(RebateApplication {
            id,
            application_number: store.next_application_number(),
            corporation_id: "corp-001".to_string(),
            category_id: "cat-001".to_string(),
            sales_dept_id: "sd-001".to_string(),
            budget_dept_id: "bd-001".to_string(),
            title: "Aggregates".to_string(),
            description: None,
            comment: None,
            period_start: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
            status: RebateStatus::Draft,
            applicant_id: "user-001".to_string(),
            applicant_name: "Tester".to_string(),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
            total_rebate_amount: Decimal::ZERO,
            model_ids: Vec::new(),
            model_names: String::new(),
        });
        id
    }

    fn line(header_id: Uuid, model_id: &str, amount: Decimal) -> RebateLine {
        let now = Utc::now();
        RebateLine {
            id: Uuid::new_v4(),
            rebate_application_id: header_id,
            application_type_id: "app-001".to_string(),
            big_category_id: "bc-001".to_string(),
            middle_category_id: "mc-001".to_string(),
            model_id: model_id.to_string(),
            price_type_id: "pt-001".to_string(),
            price: Decimal::ZERO,
            quantity: 1,
            rebate_price: Some(amount),
            rebate_rate: None,
            item_rebate_amount: amount,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sums_amounts_and_deduplicates_models() {
        let store = store_with_models();
        let header_id = header(&store);
        store.insert_line(line(header_id, "m-001", dec!(10.50)));
        store.insert_line(line(header_id, "m-002", dec!(4.25)));
        store.insert_line(line(header_id, "m-001", dec!(1.00)));

        store.recompute_aggregates(header_id);

        let header = store.get_header(header_id).unwrap();
        assert_eq!(header.total_rebate_amount, dec!(15.75));
        assert_eq!(header.model_ids, vec!["m-001", "m-002"]);
        assert_eq!(header.model_names, "Model One;Model Two");
    }

    #[test]
    fn recompute_is_idempotent() {
        let store = store_with_models();
        let header_id = header(&store);
        store.insert_line(line(header_id, "m-002", dec!(7.77)));

        store.recompute_aggregates(header_id);
        let first = store.get_header(header_id).unwrap();
        store.recompute_aggregates(header_id);
        let second = store.get_header(header_id).unwrap();

        assert_eq!(first.total_rebate_amount, second.total_rebate_amount);
        assert_eq!(first.model_ids, second.model_ids);
        assert_eq!(first.model_names, second.model_names);
    }

    #[test]
    fn unresolved_model_name_falls_back_to_raw_id() {
        let store = store_with_models();
        let header_id = header(&store);
        store.insert_line(line(header_id, "m-999", dec!(2.00)));

        store.recompute_aggregates(header_id);

        let header = store.get_header(header_id).unwrap();
        assert_eq!(header.model_names, "m-999");
    }

    #[test]
    fn empty_header_zeroes_aggregates() {
        let store = store_with_models();
        let header_id = header(&store);

        store.recompute_aggregates(header_id);

        let header = store.get_header(header_id).unwrap();
        assert_eq!(header.total_rebate_amount, Decimal::ZERO);
        assert!(header.model_ids.is_empty());
        assert_eq!(header.model_names, "");
    }
}
