use async_trait::async_trait;
use escrow_setup_config::constants::MINT_DECIMALS;
use escrow_setup_core::{
    address_book::slot_name,
    scenario::{DynError, Holding, RunContext, TokenTypeAccounts, Workload as ScenarioWorkload},
};
use solana_sdk::{pubkey::Pubkey, signature::Signature, signer::Signer as _};
use thiserror::Error;
use tokio::time::sleep;
use tracing::info;

use super::{
    funding::FUNDING_WORKLOAD,
    util::{confirm, record_slot},
};

const MINT_SLOT_PREFIX: &str = "mint";

/// Initial balance minted into one party's holding account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Seed {
    pub party: String,
    pub amount: u64,
}

impl Seed {
    #[must_use]
    pub fn new(party: impl Into<String>, amount: u64) -> Self {
        Self {
            party: party.into(),
            amount,
        }
    }
}

#[derive(Debug, Error)]
enum TokenTypeError {
    #[error("token type {token}: no holding account for seed target '{party}'")]
    UnknownSeedTarget { token: String, party: String },
}

/// Creates one token type (mint plus a holding account per party) and seeds
/// one of the holding accounts.
#[derive(Clone, Debug)]
pub struct Workload {
    token: String,
    name: String,
    seed: Option<Seed>,
}

impl Workload {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            name: format!("token_type_{}", token.to_lowercase()),
            token,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[async_trait]
impl ScenarioWorkload for Workload {
    fn name(&self) -> &str {
        &self.name
    }

    fn depends_on(&self) -> Vec<String> {
        vec![FUNDING_WORKLOAD.to_owned()]
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let delay = ctx.timings().mint_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let accounts = build_token_type(ctx, &self.token, MINT_DECIMALS).await?;
        ctx.record_token_type(accounts.clone());

        let Some(seed) = &self.seed else {
            return Ok(());
        };

        let target = accounts
            .holding(&seed.party)
            .ok_or_else(|| TokenTypeError::UnknownSeedTarget {
                token: self.token.clone(),
                party: seed.party.clone(),
            })?;

        info!(
            token = %self.token,
            party = %seed.party,
            amount = seed.amount,
            account = %target,
            "sending initial balance"
        );
        seed_balance(ctx, &accounts.mint, &target, seed.amount).await?;

        Ok(())
    }
}

/// Creates the mint for `token` and one associated token account per party,
/// confirming each transaction before the next is submitted and persisting
/// every address as soon as it exists.
pub async fn build_token_type(
    ctx: &RunContext,
    token: &str,
    decimals: u8,
) -> Result<TokenTypeAccounts, DynError> {
    let ledger = ctx.ledger();
    let operator = ctx.participants().operator();

    info!(%token, decimals, "creating mint");
    let mint = ledger
        .create_mint(operator, &operator.pubkey(), decimals)
        .await?;
    confirm(ctx, "create_mint", &mint.signature).await?;
    record_slot(ctx, &slot_name(MINT_SLOT_PREFIX, token), mint.value)?;
    info!(%token, mint = %mint.value, "mint created");

    let mut holdings = Vec::with_capacity(ctx.participants().parties().len());
    for party in ctx.participants().parties() {
        info!(%token, party = %party.display_name(), "creating token account");
        let account = ledger
            .create_associated_token_account(operator, party.pubkey(), &mint.value)
            .await?;
        confirm(ctx, "create_associated_token_account", &account.signature).await?;
        record_slot(ctx, &slot_name(party.label(), token), account.value)?;

        holdings.push(Holding {
            party: party.label().to_owned(),
            account: account.value,
        });
    }

    Ok(TokenTypeAccounts {
        name: token.to_owned(),
        mint: mint.value,
        holdings,
    })
}

/// Mints `amount` of `mint` into `account` with the operator as authority and
/// waits for confirmation.
pub async fn seed_balance(
    ctx: &RunContext,
    mint: &Pubkey,
    account: &Pubkey,
    amount: u64,
) -> Result<Signature, DynError> {
    let signature = ctx
        .ledger()
        .mint_to(ctx.participants().operator(), mint, account, amount)
        .await?;
    confirm(ctx, "mint_to", &signature).await?;
    Ok(signature)
}
