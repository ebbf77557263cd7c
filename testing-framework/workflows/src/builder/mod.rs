use escrow_setup_config::constants::{ALICE_LABEL, BOB_LABEL, SEED_AMOUNT, TOKEN_X, TOKEN_Y};
use escrow_setup_core::scenario::Builder as CoreScenarioBuilder;

use crate::{
    expectations::SeededBalances,
    workloads::{Seed, funding, token_type},
};

/// Extension methods for building setup pipelines.
pub trait ScenarioBuilderExt: Sized {
    #[must_use]
    /// Fund every party and then the operator from the faucet.
    fn fund_identities(self) -> Self;

    /// Configure a token type workload.
    fn token_type(self, token: &str) -> TokenTypeFlowBuilder;

    /// Configure a token type workload via closure.
    fn token_type_with(
        self,
        token: &str,
        f: impl FnOnce(TokenTypeFlowBuilder) -> TokenTypeFlowBuilder,
    ) -> CoreScenarioBuilder;

    #[must_use]
    /// Attach a balance check over the given token types.
    fn expect_seeded_balances(self, expectation: SeededBalances) -> Self;
}

impl ScenarioBuilderExt for CoreScenarioBuilder {
    fn fund_identities(self) -> Self {
        self.with_workload(funding::Workload::new())
    }

    fn token_type(self, token: &str) -> TokenTypeFlowBuilder {
        TokenTypeFlowBuilder::new(self, token)
    }

    fn token_type_with(
        self,
        token: &str,
        f: impl FnOnce(TokenTypeFlowBuilder) -> TokenTypeFlowBuilder,
    ) -> CoreScenarioBuilder {
        f(self.token_type(token)).apply()
    }

    fn expect_seeded_balances(self, expectation: SeededBalances) -> Self {
        self.with_expectation(expectation)
    }
}

/// Builder for one token type workload.
pub struct TokenTypeFlowBuilder {
    builder: CoreScenarioBuilder,
    workload: token_type::Workload,
}

impl TokenTypeFlowBuilder {
    fn new(builder: CoreScenarioBuilder, token: &str) -> Self {
        Self {
            builder,
            workload: token_type::Workload::new(token),
        }
    }

    #[must_use]
    /// Mint `amount` into `party`'s holding account once it exists.
    pub fn seed(mut self, party: &str, amount: u64) -> Self {
        self.workload = self.workload.with_seed(Seed::new(party, amount));
        self
    }

    #[must_use]
    pub fn apply(self) -> CoreScenarioBuilder {
        self.builder.with_workload(self.workload)
    }
}

/// The escrow setup pipeline: fund Alice, Bob and the operator, build X
/// seeding Alice with 50, build Y seeding Bob with 50, then check and collect
/// all four balances.
#[must_use]
pub fn escrow_setup(parallel_branches: bool) -> CoreScenarioBuilder {
    CoreScenarioBuilder::new()
        .fund_identities()
        .token_type_with(TOKEN_X, |t| t.seed(ALICE_LABEL, SEED_AMOUNT))
        .token_type_with(TOKEN_Y, |t| t.seed(BOB_LABEL, SEED_AMOUNT))
        .expect_seeded_balances(
            SeededBalances::new()
                .token(TOKEN_X, Some(Seed::new(ALICE_LABEL, SEED_AMOUNT)))
                .token(TOKEN_Y, Some(Seed::new(BOB_LABEL, SEED_AMOUNT))),
        )
        .with_parallel_branches(parallel_branches)
}
