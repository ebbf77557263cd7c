use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use thiserror::Error;
use tracing::info;

use super::{expectation::Expectation, workload::Workload};

#[derive(Debug, Error)]
pub enum ScenarioBuildError {
    #[error("scenario has no workloads")]
    NoWorkloads,
    #[error("workload '{name}' is declared more than once")]
    DuplicateWorkload { name: String },
    #[error("workload '{workload}' depends on unknown workload '{dependency}'")]
    UnknownDependency {
        workload: String,
        dependency: String,
    },
    #[error("dependency cycle between workloads: {}", .workloads.join(", "))]
    DependencyCycle { workloads: Vec<String> },
}

/// Validated pipeline: workloads layered into stages so that every workload
/// sits in a later stage than everything it depends on.
pub struct Scenario {
    stages: Vec<Vec<Arc<dyn Workload>>>,
    expectations: Vec<Box<dyn Expectation>>,
    parallel_branches: bool,
}

impl Scenario {
    #[must_use]
    pub fn stages(&self) -> &[Vec<Arc<dyn Workload>>] {
        &self.stages
    }

    /// Workload names in execution order.
    #[must_use]
    pub fn workload_names(&self) -> Vec<String> {
        self.stages
            .iter()
            .flatten()
            .map(|workload| workload.name().to_owned())
            .collect()
    }

    #[must_use]
    pub fn expectations(&self) -> &[Box<dyn Expectation>] {
        &self.expectations
    }

    #[must_use]
    pub fn expectations_mut(&mut self) -> &mut [Box<dyn Expectation>] {
        &mut self.expectations
    }

    /// Whether workloads sharing a stage may run concurrently.
    #[must_use]
    pub const fn parallel_branches(&self) -> bool {
        self.parallel_branches
    }
}

/// Builder used by callers to describe the pipeline.
#[derive(Default)]
pub struct Builder {
    workloads: Vec<Box<dyn Workload>>,
    expectations: Vec<Box<dyn Expectation>>,
    parallel_branches: bool,
}

pub type ScenarioBuilder = Builder;

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Add a workload and the expectations it brings along.
    pub fn with_workload<W>(mut self, workload: W) -> Self
    where
        W: Workload + 'static,
    {
        self.expectations.extend(workload.expectations());
        self.workloads.push(Box::new(workload));
        self
    }

    #[must_use]
    /// Add a standalone expectation not tied to a workload.
    pub fn with_expectation<E>(mut self, expectation: E) -> Self
    where
        E: Expectation + 'static,
    {
        self.expectations.push(Box::new(expectation));
        self
    }

    #[must_use]
    /// Let independent workloads of the same stage run concurrently.
    pub const fn with_parallel_branches(mut self, enabled: bool) -> Self {
        self.parallel_branches = enabled;
        self
    }

    /// Finalize the scenario, validating the dependency graph.
    pub fn build(self) -> Result<Scenario, ScenarioBuildError> {
        let Self {
            workloads,
            expectations,
            parallel_branches,
        } = self;

        let stages = layer_stages(workloads)?;

        info!(
            stages = stages.len(),
            workloads = stages.iter().map(Vec::len).sum::<usize>(),
            expectations = expectations.len(),
            parallel_branches,
            "scenario built"
        );

        Ok(Scenario {
            stages,
            expectations,
            parallel_branches,
        })
    }
}

fn layer_stages(
    workloads: Vec<Box<dyn Workload>>,
) -> Result<Vec<Vec<Arc<dyn Workload>>>, ScenarioBuildError> {
    if workloads.is_empty() {
        return Err(ScenarioBuildError::NoWorkloads);
    }

    let names: Vec<String> = workloads.iter().map(|w| w.name().to_owned()).collect();
    let dependencies: Vec<Vec<String>> = workloads.iter().map(|w| w.depends_on()).collect();

    let mut declared = HashSet::with_capacity(names.len());
    for name in &names {
        if !declared.insert(name.as_str()) {
            return Err(ScenarioBuildError::DuplicateWorkload { name: name.clone() });
        }
    }

    for (name, deps) in names.iter().zip(&dependencies) {
        if let Some(missing) = deps.iter().find(|dep| !declared.contains(dep.as_str())) {
            return Err(ScenarioBuildError::UnknownDependency {
                workload: name.clone(),
                dependency: missing.clone(),
            });
        }
    }

    let mut placed: HashMap<&str, usize> = HashMap::with_capacity(names.len());
    let mut remaining: Vec<usize> = (0..names.len()).collect();
    let mut layers: Vec<Vec<usize>> = Vec::new();

    while !remaining.is_empty() {
        let ready: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&idx| {
                dependencies[idx]
                    .iter()
                    .all(|dep| placed.contains_key(dep.as_str()))
            })
            .collect();

        if ready.is_empty() {
            return Err(ScenarioBuildError::DependencyCycle {
                workloads: remaining.iter().map(|&idx| names[idx].clone()).collect(),
            });
        }

        let level = layers.len();
        for &idx in &ready {
            placed.insert(names[idx].as_str(), level);
        }
        remaining.retain(|idx| !ready.contains(idx));
        layers.push(ready);
    }

    let mut slots: Vec<Option<Arc<dyn Workload>>> =
        workloads.into_iter().map(|w| Some(Arc::from(w))).collect();

    Ok(layers
        .into_iter()
        .map(|layer| layer.into_iter().filter_map(|idx| slots[idx].take()).collect())
        .collect())
}
