use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use escrow_setup_core::{
    SetupTimings,
    address_book::AddressBook,
    ledger::MemoryLedger,
    scenario::{
        DynError, Expectation, Participants, RunContext, Runner, ScenarioBuildError,
        ScenarioBuilder, ScenarioError, Workload,
    },
};
use solana_sdk::signature::Keypair;
use tempfile::TempDir;

type Journal = Arc<Mutex<Vec<String>>>;

struct Step {
    name: String,
    after: Vec<String>,
    pause: Duration,
    fail: bool,
    journal: Journal,
}

impl Step {
    fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_owned(),
            after: Vec::new(),
            pause: Duration::ZERO,
            fail: false,
            journal: Arc::clone(journal),
        }
    }

    fn after(mut self, deps: &[&str]) -> Self {
        self.after = deps.iter().map(|dep| (*dep).to_owned()).collect();
        self
    }

    fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Workload for Step {
    fn name(&self) -> &str {
        &self.name
    }

    fn depends_on(&self) -> Vec<String> {
        self.after.clone()
    }

    async fn start(&self, _ctx: &RunContext) -> Result<(), DynError> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:start", self.name));
        tokio::time::sleep(self.pause).await;
        if self.fail {
            return Err(format!("{} gave up", self.name).into());
        }
        self.journal.lock().unwrap().push(format!("{}:end", self.name));
        Ok(())
    }
}

struct Verdict {
    name: &'static str,
    pass: bool,
}

#[async_trait]
impl Expectation for Verdict {
    fn name(&self) -> &str {
        self.name
    }

    async fn evaluate(&mut self, _ctx: &RunContext) -> Result<(), DynError> {
        if self.pass {
            Ok(())
        } else {
            Err(format!("{} not met", self.name).into())
        }
    }
}

fn context(dir: &TempDir) -> RunContext {
    RunContext::new(
        Arc::new(MemoryLedger::new()),
        Participants::new(Vec::new(), Keypair::new()),
        AddressBook::open(dir.path().join("addresses.json")).unwrap(),
        SetupTimings::immediate(),
    )
}

fn position(journal: &Journal, entry: &str) -> usize {
    journal
        .lock()
        .unwrap()
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry} missing from journal"))
}

#[test]
fn empty_pipeline_is_rejected() {
    let err = ScenarioBuilder::new().build().err().unwrap();
    assert!(matches!(err, ScenarioBuildError::NoWorkloads));
}

#[test]
fn duplicate_names_are_rejected() {
    let journal = Journal::default();
    let err = ScenarioBuilder::new()
        .with_workload(Step::new("fund", &journal))
        .with_workload(Step::new("fund", &journal))
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, ScenarioBuildError::DuplicateWorkload { name } if name == "fund"));
}

#[test]
fn unknown_dependencies_are_rejected() {
    let journal = Journal::default();
    let err = ScenarioBuilder::new()
        .with_workload(Step::new("mint", &journal).after(&["fund"]))
        .build()
        .err()
        .unwrap();

    assert!(matches!(
        err,
        ScenarioBuildError::UnknownDependency { workload, dependency }
            if workload == "mint" && dependency == "fund"
    ));
}

#[test]
fn cycles_are_rejected() {
    let journal = Journal::default();
    let err = ScenarioBuilder::new()
        .with_workload(Step::new("root", &journal))
        .with_workload(Step::new("a", &journal).after(&["b"]))
        .with_workload(Step::new("b", &journal).after(&["a"]))
        .build()
        .err()
        .unwrap();

    match err {
        ScenarioBuildError::DependencyCycle { workloads } => {
            assert_eq!(workloads, vec!["a".to_owned(), "b".to_owned()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn stages_follow_dependencies_and_declaration_order() {
    let journal = Journal::default();
    let scenario = ScenarioBuilder::new()
        .with_workload(Step::new("x", &journal).after(&["fund"]))
        .with_workload(Step::new("fund", &journal))
        .with_workload(Step::new("y", &journal).after(&["fund"]))
        .with_workload(Step::new("report", &journal).after(&["x", "y"]))
        .build()
        .unwrap();

    let stages: Vec<Vec<&str>> = scenario
        .stages()
        .iter()
        .map(|stage| stage.iter().map(|w| w.name()).collect())
        .collect();
    assert_eq!(stages, vec![vec!["fund"], vec!["x", "y"], vec!["report"]]);
    assert_eq!(scenario.workload_names(), ["fund", "x", "y", "report"]);
}

#[tokio::test]
async fn sequential_runs_do_not_interleave_branches() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::default();
    let mut scenario = ScenarioBuilder::new()
        .with_workload(Step::new("fund", &journal))
        .with_workload(
            Step::new("x", &journal)
                .after(&["fund"])
                .pause(Duration::from_millis(30)),
        )
        .with_workload(Step::new("y", &journal).after(&["fund"]))
        .build()
        .unwrap();

    Runner::new(context(&dir)).run(&mut scenario).await.unwrap();

    assert_eq!(
        *journal.lock().unwrap(),
        ["fund:start", "fund:end", "x:start", "x:end", "y:start", "y:end"]
    );
}

#[tokio::test]
async fn parallel_branches_overlap_but_wait_for_dependencies() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::default();
    let mut scenario = ScenarioBuilder::new()
        .with_workload(Step::new("fund", &journal).pause(Duration::from_millis(10)))
        .with_workload(
            Step::new("x", &journal)
                .after(&["fund"])
                .pause(Duration::from_millis(50)),
        )
        .with_workload(
            Step::new("y", &journal)
                .after(&["fund"])
                .pause(Duration::from_millis(50)),
        )
        .with_parallel_branches(true)
        .build()
        .unwrap();

    Runner::new(context(&dir)).run(&mut scenario).await.unwrap();

    let fund_end = position(&journal, "fund:end");
    assert!(fund_end < position(&journal, "x:start"));
    assert!(fund_end < position(&journal, "y:start"));
    assert!(position(&journal, "y:start") < position(&journal, "x:end"));
    assert!(position(&journal, "x:start") < position(&journal, "y:end"));
}

#[tokio::test]
async fn failing_workload_stops_later_stages() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::default();
    let mut scenario = ScenarioBuilder::new()
        .with_workload(Step::new("fund", &journal).failing())
        .with_workload(Step::new("x", &journal).after(&["fund"]))
        .with_expectation(Verdict {
            name: "never_checked",
            pass: false,
        })
        .build()
        .unwrap();

    let err = Runner::new(context(&dir))
        .run(&mut scenario)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ScenarioError::Workload { ref name, .. } if name == "fund"));
    assert_eq!(*journal.lock().unwrap(), ["fund:start"]);
}

#[tokio::test]
async fn expectation_failures_are_reported_together() {
    let dir = TempDir::new().unwrap();
    let journal = Journal::default();
    let mut scenario = ScenarioBuilder::new()
        .with_workload(Step::new("fund", &journal))
        .with_expectation(Verdict {
            name: "first",
            pass: false,
        })
        .with_expectation(Verdict {
            name: "second",
            pass: true,
        })
        .with_expectation(Verdict {
            name: "third",
            pass: false,
        })
        .build()
        .unwrap();

    let err = Runner::new(context(&dir))
        .run(&mut scenario)
        .await
        .err()
        .unwrap();

    let ScenarioError::Expectations(source) = &err else {
        panic!("expected aggregated expectation failure, got {err}");
    };
    let summary = source.to_string();
    assert!(summary.contains("first: first not met"));
    assert!(summary.contains("third: third not met"));
    assert!(!summary.contains("second"));
}
