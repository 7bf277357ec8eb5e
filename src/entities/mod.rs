pub mod rebate;
pub mod reference;

pub use rebate::{
    RebateApplication, RebateLine, RebateLineWithRelations, RebateStats, RebateStatus,
    RebateWithRelations,
};
pub use reference::{
    ApplicationType, BigCategory, BudgetDept, Category, Corporation, MiddleCategory, PriceType,
    ProductModel, SalesDept,
};
