mod error;
pub mod memory;
pub mod rpc;

use async_trait::async_trait;
pub use error::LedgerError;
pub use memory::{LedgerEvent, MemoryLedger, Operation};
pub use rpc::RpcLedger;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};

/// Address of a freshly created ledger entity together with the transaction
/// that creates it. The entity only exists once `signature` is confirmed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Submitted<T> {
    pub value: T,
    pub signature: Signature,
}

impl<T> Submitted<T> {
    pub const fn new(value: T, signature: Signature) -> Self {
        Self { value, signature }
    }
}

/// Network operations the setup pipeline drives. Every mutating call only
/// submits; callers wait with [`LedgerClient::confirm`] before relying on the
/// result.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Ask the faucet to credit `lamports` to `recipient`.
    async fn request_airdrop(
        &self,
        recipient: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError>;

    /// Block until `signature` reaches the client's commitment, or fail.
    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError>;

    /// Create a mint with `payer` paying fees and rent. No freeze authority.
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        decimals: u8,
    ) -> Result<Submitted<Pubkey>, LedgerError>;

    /// Create the associated token account of `owner` for `mint`.
    async fn create_associated_token_account(
        &self,
        payer: &Keypair,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Submitted<Pubkey>, LedgerError>;

    /// Mint `amount` units of `mint` into `destination`, signed by the mint
    /// authority (which also pays the fee).
    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        amount: u64,
    ) -> Result<Signature, LedgerError>;

    /// Raw token balance of a holding account.
    async fn token_balance(&self, account: &Pubkey) -> Result<u64, LedgerError>;
}

/// Associated token account address for `owner` and `mint` under the SPL
/// token program.
#[must_use]
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account_client::address::get_associated_token_address_with_program_id(
        owner,
        mint,
        &spl_token::id(),
    )
}
