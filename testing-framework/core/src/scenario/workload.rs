use async_trait::async_trait;

use super::{DynError, Expectation, RunContext};

#[async_trait]
/// One step of the setup pipeline.
pub trait Workload: Send + Sync {
    fn name(&self) -> &str;

    /// Names of workloads whose effects must be confirmed before this one
    /// starts.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    fn expectations(&self) -> Vec<Box<dyn Expectation>> {
        Vec::new()
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError>;
}
