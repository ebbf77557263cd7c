use async_trait::async_trait;

use super::{DynError, RunContext};

#[async_trait]
/// Defines a check evaluated after every workload has finished.
pub trait Expectation: Send + Sync {
    fn name(&self) -> &str;

    async fn start_capture(&mut self, _ctx: &RunContext) -> Result<(), DynError> {
        Ok(())
    }

    async fn evaluate(&mut self, ctx: &RunContext) -> Result<(), DynError>;
}
