mod context;
mod runner;

pub use context::{
    BalanceRow, FundingReceipt, Holding, Participants, Party, RunContext, TokenTypeAccounts,
};
pub use runner::Runner;
use thiserror::Error;

use super::DynError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("workload '{name}' failed")]
    Workload {
        name: String,
        #[source]
        source: DynError,
    },
    #[error("expectation capture failed")]
    ExpectationCapture(#[source] DynError),
    #[error("expectations failed")]
    Expectations(#[source] DynError),
}
