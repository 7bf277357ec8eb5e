pub mod rebates;

pub use rebates::RebateService;
