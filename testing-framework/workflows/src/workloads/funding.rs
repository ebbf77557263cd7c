use async_trait::async_trait;
use escrow_setup_config::constants::AIRDROP_SOL;
use escrow_setup_core::{
    ledger::LedgerError,
    retry::RetryPolicy,
    scenario::{DynError, FundingReceipt, Participants, RunContext, Workload as ScenarioWorkload},
};
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use tokio::time::sleep;
use tracing::info;

use super::util::confirm;

pub const FUNDING_WORKLOAD: &str = "fund_identities";

/// The operator signs as the escrow client.
const OPERATOR_NAME: &str = "Client";

/// Every end-party in declaration order, then the operator.
fn identities(participants: &Participants) -> Vec<(String, Pubkey)> {
    let mut identities: Vec<_> = participants
        .parties()
        .iter()
        .map(|party| (party.display_name(), *party.pubkey()))
        .collect();
    identities.push((OPERATOR_NAME.to_owned(), participants.operator_pubkey()));
    identities
}

/// Requests [`AIRDROP_SOL`] for every end-party and then the operator, waiting
/// for each credit to be confirmed before asking for the next one.
#[derive(Clone, Copy, Debug)]
pub struct Workload {
    lamports: u64,
}

impl Workload {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lamports: AIRDROP_SOL * LAMPORTS_PER_SOL,
        }
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScenarioWorkload for Workload {
    fn name(&self) -> &str {
        FUNDING_WORKLOAD
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let timings = ctx.timings();
        let retry = RetryPolicy::new(
            timings.faucet_attempts,
            timings.faucet_backoff,
            timings.faucet_backoff_cap,
        );

        for (identity, recipient) in identities(ctx.participants()) {
            if !timings.faucet_delay.is_zero() {
                sleep(timings.faucet_delay).await;
            }

            info!(%identity, %recipient, lamports = self.lamports, "requesting SOL");
            let signature = retry
                .run("request_airdrop", LedgerError::is_rate_limited, || {
                    ctx.ledger().request_airdrop(&recipient, self.lamports)
                })
                .await?;

            confirm(ctx, "airdrop", &signature).await?;
            ctx.record_funding(FundingReceipt {
                recipient,
                lamports: self.lamports,
                signature,
            });
            info!(%identity, %signature, "airdrop confirmed");
        }

        Ok(())
    }
}
