use escrow_setup_core::{
    address_book::WriteOutcome,
    ledger::LedgerError,
    scenario::{DynError, RunContext},
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{debug, warn};

/// Waits for `signature` and logs how long the ledger kept us waiting.
pub async fn confirm(
    ctx: &RunContext,
    step: &str,
    signature: &Signature,
) -> Result<(), LedgerError> {
    debug!(step, %signature, "waiting for confirmation");
    let started = tokio::time::Instant::now();
    ctx.ledger().confirm(signature).await?;
    debug!(
        step,
        %signature,
        elapsed_ms = started.elapsed().as_millis(),
        "confirmed"
    );
    Ok(())
}

/// Persists `address` under `slot`, noting when an earlier run left a
/// different address behind.
pub fn record_slot(ctx: &RunContext, slot: &str, address: Pubkey) -> Result<(), DynError> {
    match ctx.record_address(slot, address)? {
        WriteOutcome::Replaced { previous } => {
            warn!(slot, %previous, %address, "address slot overwritten");
        }
        WriteOutcome::Inserted | WriteOutcome::Unchanged => {
            debug!(slot, %address, "address slot written");
        }
    }
    Ok(())
}
