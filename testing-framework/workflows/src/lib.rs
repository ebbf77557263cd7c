pub mod builder;
pub mod expectations;
pub mod report;
pub mod workloads;

pub use builder::{ScenarioBuilderExt, TokenTypeFlowBuilder, escrow_setup};
pub use expectations::SeededBalances;
pub use report::BalanceReport;
