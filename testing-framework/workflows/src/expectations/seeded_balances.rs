use async_trait::async_trait;
use escrow_setup_core::scenario::{BalanceRow, DynError, Expectation, RunContext};
use thiserror::Error;

use crate::workloads::Seed;

#[derive(Clone, Debug)]
struct TokenSeed {
    token: String,
    seed: Option<Seed>,
}

/// Reads every holding account of the listed token types and checks that only
/// the seeded account holds a balance. The collected balances are stored on
/// the run context for reporting.
#[derive(Clone, Debug, Default)]
pub struct SeededBalances {
    tokens: Vec<TokenSeed>,
}

#[derive(Debug, Error)]
enum SeededBalanceIssue {
    #[error("{party}'s {token} account {account} holds {actual}, expected {expected}")]
    Mismatch {
        party: String,
        token: String,
        account: String,
        actual: u64,
        expected: u64,
    },
}

#[derive(Debug, Error)]
enum SeededBalancesError {
    #[error("token type {token} was never built")]
    MissingTokenType { token: String },
    #[error("token type {token} has no holding account for {party}")]
    MissingHolding { token: String, party: String },
    #[error("seeded balances violated:\n{details}")]
    Violations {
        #[source]
        details: ViolationIssues,
    },
}

#[derive(Debug, Error)]
#[error("{}", format_issues(.issues))]
struct ViolationIssues {
    issues: Vec<SeededBalanceIssue>,
}

fn format_issues(issues: &[SeededBalanceIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl SeededBalances {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `token`; `seed` names the only account expected to be non-zero.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>, seed: Option<Seed>) -> Self {
        self.tokens.push(TokenSeed {
            token: token.into(),
            seed,
        });
        self
    }

    fn expected(&self, token: &TokenSeed, party: &str) -> u64 {
        token
            .seed
            .as_ref()
            .filter(|seed| seed.party == party)
            .map_or(0, |seed| seed.amount)
    }

    async fn collect(&self, ctx: &RunContext) -> Result<Vec<BalanceRow>, DynError> {
        let mut rows = Vec::new();

        for party in ctx.participants().parties() {
            for tracked in &self.tokens {
                let accounts = ctx.token_type(&tracked.token).ok_or_else(|| {
                    SeededBalancesError::MissingTokenType {
                        token: tracked.token.clone(),
                    }
                })?;
                let account = accounts.holding(party.label()).ok_or_else(|| {
                    SeededBalancesError::MissingHolding {
                        token: tracked.token.clone(),
                        party: party.label().to_owned(),
                    }
                })?;

                let amount = ctx.ledger().token_balance(&account).await?;
                tracing::debug!(
                    party = party.label(),
                    token = %tracked.token,
                    %account,
                    amount,
                    "balance collected"
                );

                rows.push(BalanceRow {
                    party: party.label().to_owned(),
                    token: tracked.token.clone(),
                    account,
                    amount,
                });
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl Expectation for SeededBalances {
    fn name(&self) -> &str {
        "seeded_balances"
    }

    async fn evaluate(&mut self, ctx: &RunContext) -> Result<(), DynError> {
        let rows = self.collect(ctx).await?;
        ctx.record_balances(rows.clone());

        let issues: Vec<_> = rows
            .iter()
            .filter_map(|row| {
                let tracked = self.tokens.iter().find(|t| t.token == row.token)?;
                let expected = self.expected(tracked, &row.party);
                (row.amount != expected).then(|| SeededBalanceIssue::Mismatch {
                    party: row.party.clone(),
                    token: row.token.clone(),
                    account: row.account.to_string(),
                    actual: row.amount,
                    expected,
                })
            })
            .collect();

        if issues.is_empty() {
            tracing::info!(accounts = rows.len(), "seeded balances match");
            return Ok(());
        }

        Err(Box::new(SeededBalancesError::Violations {
            details: ViolationIssues { issues },
        }))
    }
}
