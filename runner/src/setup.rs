use std::sync::Arc;

use anyhow::{Context as _, Result};
use escrow_setup_config::{
    SetupConfig,
    constants::{ALICE_LABEL, BOB_LABEL, OPERATOR_LABEL},
};
use escrow_setup_core::{
    address_book::AddressBook,
    keys::KeyStore,
    ledger::{LedgerClient, RpcLedger},
    scenario::{Participants, Party, RunContext, Runner},
};
use escrow_setup_workflows::{BalanceReport, escrow_setup};
use tracing::info;

/// Alice and Bob as public keys, the operator as a full keypair.
pub fn load_participants(keys: &KeyStore) -> Result<Participants> {
    let alice = keys
        .load_public_key(ALICE_LABEL)
        .with_context(|| format!("loading public key '{ALICE_LABEL}'"))?;
    let bob = keys
        .load_public_key(BOB_LABEL)
        .with_context(|| format!("loading public key '{BOB_LABEL}'"))?;
    let operator = keys
        .load_keypair(OPERATOR_LABEL)
        .with_context(|| format!("loading keypair '{OPERATOR_LABEL}'"))?;

    Ok(Participants::new(
        vec![Party::new(ALICE_LABEL, alice), Party::new(BOB_LABEL, bob)],
        operator,
    ))
}

pub fn open_address_book(config: &SetupConfig) -> Result<AddressBook> {
    let book = AddressBook::open(&config.address_book)
        .with_context(|| format!("opening address book {}", config.address_book.display()))?;

    Ok(if config.slot_files {
        book.with_slot_files(&config.keys_dir)
    } else {
        book
    })
}

/// Runs the whole setup against the configured RPC endpoint.
pub async fn run_setup(config: &SetupConfig) -> Result<BalanceReport> {
    let ledger = Arc::new(RpcLedger::from_config(config));
    info!(rpc = %ledger.url(), commitment = %config.commitment, "ledger client ready");
    run_with_ledger(config, ledger).await
}

pub async fn run_with_ledger(
    config: &SetupConfig,
    ledger: Arc<dyn LedgerClient>,
) -> Result<BalanceReport> {
    let participants = load_participants(&KeyStore::new(&config.keys_dir))?;
    let address_book = open_address_book(config)?;

    let mut scenario = escrow_setup(config.parallel_branches)
        .build()
        .context("building setup pipeline failed")?;
    info!(workloads = ?scenario.workload_names(), "setup pipeline planned");

    let context = RunContext::new(ledger, participants, address_book, config.timings);
    let context = Runner::new(context)
        .run(&mut scenario)
        .await
        .context("running escrow setup failed")?;

    Ok(BalanceReport::from_context(&context))
}
