use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt as _;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::ScenarioError;
use crate::scenario::{DynError, Expectation, RunContext, Scenario, Workload};

type WorkloadOutcome = (String, Result<(), DynError>);

/// Drives a built [`Scenario`] against a prepared [`RunContext`].
pub struct Runner {
    context: Arc<RunContext>,
}

impl Runner {
    #[must_use]
    pub fn new(context: RunContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Access the underlying run context.
    #[must_use]
    pub fn context(&self) -> Arc<RunContext> {
        Arc::clone(&self.context)
    }

    /// Executes the scenario stage by stage and then evaluates all
    /// expectations. The first failing workload aborts the run; nothing already
    /// confirmed on the ledger is undone.
    pub async fn run(self, scenario: &mut Scenario) -> Result<Arc<RunContext>, ScenarioError> {
        let context = self.context();

        Self::prepare_expectations(scenario.expectations_mut(), context.as_ref()).await?;
        Self::run_stages(&context, scenario).await?;
        Self::run_expectations(scenario.expectations_mut(), context.as_ref()).await?;

        Ok(context)
    }

    async fn prepare_expectations(
        expectations: &mut [Box<dyn Expectation>],
        context: &RunContext,
    ) -> Result<(), ScenarioError> {
        for expectation in expectations {
            if let Err(source) = expectation.start_capture(context).await {
                return Err(ScenarioError::ExpectationCapture(source));
            }
        }
        Ok(())
    }

    async fn run_stages(
        context: &Arc<RunContext>,
        scenario: &Scenario,
    ) -> Result<(), ScenarioError> {
        for (stage, workloads) in scenario.stages().iter().enumerate() {
            let names: Vec<&str> = workloads.iter().map(|w| w.name()).collect();
            info!(stage, workloads = ?names, "running stage");

            if scenario.parallel_branches() && workloads.len() > 1 {
                Self::run_concurrently(context, workloads).await?;
            } else {
                for workload in workloads {
                    workload
                        .start(context.as_ref())
                        .await
                        .map_err(|source| ScenarioError::Workload {
                            name: workload.name().to_owned(),
                            source,
                        })?;
                }
            }
        }
        Ok(())
    }

    /// Spawns each workload of a stage inside its own task and waits for all of
    /// them; the first failure aborts the rest.
    async fn run_concurrently(
        context: &Arc<RunContext>,
        workloads: &[Arc<dyn Workload>],
    ) -> Result<(), ScenarioError> {
        let mut tasks: JoinSet<WorkloadOutcome> = JoinSet::new();
        for workload in workloads {
            let workload = Arc::clone(workload);
            let ctx = Arc::clone(context);

            tasks.spawn(async move {
                let name = workload.name().to_owned();
                let outcome = AssertUnwindSafe(async { workload.start(ctx.as_ref()).await })
                    .catch_unwind()
                    .await;

                let outcome = outcome.unwrap_or_else(|panic| {
                    Err(format!("workload panicked: {}", panic_message(panic)).into())
                });
                (name, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = match joined {
                Ok(result) => result,
                Err(join_err) if join_err.is_cancelled() => continue,
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(ScenarioError::Workload {
                        name: "<unknown>".to_owned(),
                        source: format!("workload task failed: {join_err}").into(),
                    });
                }
            };

            if let Err(source) = outcome {
                warn!(workload = %name, "workload failed; aborting its siblings");
                tasks.abort_all();
                return Err(ScenarioError::Workload { name, source });
            }
        }

        Ok(())
    }

    /// Evaluates every registered expectation, aggregating failures so callers
    /// can see all missing conditions in a single report.
    async fn run_expectations(
        expectations: &mut [Box<dyn Expectation>],
        context: &RunContext,
    ) -> Result<(), ScenarioError> {
        let mut failures: Vec<(String, DynError)> = Vec::new();
        for expectation in expectations {
            if let Err(source) = expectation.evaluate(context).await {
                failures.push((expectation.name().to_owned(), source));
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        let summary = failures
            .into_iter()
            .map(|(name, source)| format!("{name}: {source}"))
            .collect::<Vec<_>>()
            .join("\n");

        Err(ScenarioError::Expectations(summary.into()))
    }
}

/// Attempts to turn a panic payload into a readable string for diagnostics.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}
