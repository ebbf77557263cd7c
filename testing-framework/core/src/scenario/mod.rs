mod definition;
mod expectation;
pub mod runtime;
mod workload;

pub use definition::{Builder, Scenario, ScenarioBuildError, ScenarioBuilder};
pub use expectation::Expectation;
pub use runtime::{
    BalanceRow, FundingReceipt, Holding, Participants, Party, RunContext, Runner, ScenarioError,
    TokenTypeAccounts,
};
pub use workload::Workload;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
