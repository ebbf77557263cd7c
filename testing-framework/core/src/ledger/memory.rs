use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer as _,
};
use tracing::debug;

use super::{LedgerClient, LedgerError, Submitted, associated_token_address};

pub const FEE_LAMPORTS: u64 = 5_000;
pub const MINT_RENT_LAMPORTS: u64 = 1_461_600;
pub const TOKEN_ACCOUNT_RENT_LAMPORTS: u64 = 2_039_280;

/// A mutating operation as submitted to the ledger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Airdrop {
        recipient: Pubkey,
        lamports: u64,
    },
    CreateMint {
        mint: Pubkey,
        mint_authority: Pubkey,
        decimals: u8,
    },
    CreateAccount {
        address: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    },
    MintTo {
        mint: Pubkey,
        destination: Pubkey,
        amount: u64,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LedgerEvent {
    Submitted {
        signature: Signature,
        operation: Operation,
    },
    Confirmed {
        signature: Signature,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MintAccount {
    pub address: Pubkey,
    pub mint_authority: Pubkey,
    pub freeze_authority: Option<Pubkey>,
    pub decimals: u8,
    pub supply: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TokenAccount {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

#[derive(Default)]
struct State {
    lamports: HashMap<Pubkey, u64>,
    mints: Vec<MintAccount>,
    token_accounts: Vec<TokenAccount>,
    pending: HashMap<Signature, Operation>,
    confirmed: HashSet<Signature>,
    events: Vec<LedgerEvent>,
    faucet_limits: HashMap<Pubkey, usize>,
    next_signature: u64,
}

/// In-process ledger. Effects of a transaction become visible only once it is
/// confirmed, and every submission and confirmation is recorded in order.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `failures` faucet requests for `recipient` with a rate
    /// limit error. `usize::MAX` rejects forever.
    pub fn rate_limit_faucet(&self, recipient: Pubkey, failures: usize) {
        self.lock().faucet_limits.insert(recipient, failures);
    }

    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.lock().events.clone()
    }

    #[must_use]
    pub fn mints(&self) -> Vec<MintAccount> {
        self.lock().mints.clone()
    }

    #[must_use]
    pub fn token_accounts(&self) -> Vec<TokenAccount> {
        self.lock().token_accounts.clone()
    }

    #[must_use]
    pub fn lamports(&self, account: &Pubkey) -> u64 {
        self.lock().lamports.get(account).copied().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn submit(&mut self, operation: Operation) -> Signature {
        self.next_signature += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&self.next_signature.to_le_bytes());
        let signature = Signature::from(bytes);

        self.pending.insert(signature, operation);
        self.events.push(LedgerEvent::Submitted {
            signature,
            operation,
        });
        debug!(%signature, ?operation, "memory ledger accepted transaction");
        signature
    }

    fn charge(
        &mut self,
        operation: &'static str,
        payer: &Pubkey,
        lamports: u64,
    ) -> Result<(), LedgerError> {
        let balance = self.lamports.entry(*payer).or_default();
        if *balance < lamports {
            return Err(LedgerError::rejected(
                operation,
                format!(
                    "insufficient funds for fee: {payer} holds {balance} lamports, needs {lamports}"
                ),
            ));
        }
        *balance -= lamports;
        Ok(())
    }

    fn mint(&self, address: &Pubkey) -> Option<&MintAccount> {
        self.mints.iter().find(|mint| mint.address == *address)
    }

    fn token_account(&self, address: &Pubkey) -> Option<&TokenAccount> {
        self.token_accounts
            .iter()
            .find(|account| account.address == *address)
    }

    fn apply(&mut self, operation: Operation) {
        match operation {
            Operation::Airdrop {
                recipient,
                lamports,
            } => {
                *self.lamports.entry(recipient).or_default() += lamports;
            }
            Operation::CreateMint {
                mint,
                mint_authority,
                decimals,
            } => self.mints.push(MintAccount {
                address: mint,
                mint_authority,
                freeze_authority: None,
                decimals,
                supply: 0,
            }),
            Operation::CreateAccount {
                address,
                owner,
                mint,
            } => self.token_accounts.push(TokenAccount {
                address,
                owner,
                mint,
                amount: 0,
            }),
            Operation::MintTo {
                mint,
                destination,
                amount,
            } => {
                if let Some(record) = self.mints.iter_mut().find(|m| m.address == mint) {
                    record.supply += amount;
                }
                if let Some(account) = self
                    .token_accounts
                    .iter_mut()
                    .find(|a| a.address == destination)
                {
                    account.amount += amount;
                }
            }
        }
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn request_airdrop(
        &self,
        recipient: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError> {
        let mut state = self.lock();

        if let Some(remaining) = state.faucet_limits.get_mut(recipient) {
            if *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return Err(LedgerError::RateLimited {
                    operation: "request_airdrop",
                    message: format!("429 Too Many Requests for {recipient}"),
                });
            }
        }

        Ok(state.submit(Operation::Airdrop {
            recipient: *recipient,
            lamports,
        }))
    }

    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError> {
        let mut state = self.lock();

        if state.confirmed.contains(signature) {
            return Ok(());
        }

        let operation =
            state
                .pending
                .remove(signature)
                .ok_or_else(|| LedgerError::TransactionFailed {
                    signature: *signature,
                    message: "signature not found".to_owned(),
                })?;

        state.apply(operation);
        state.confirmed.insert(*signature);
        state.events.push(LedgerEvent::Confirmed {
            signature: *signature,
        });
        Ok(())
    }

    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        decimals: u8,
    ) -> Result<Submitted<Pubkey>, LedgerError> {
        let mut state = self.lock();
        state.charge(
            "create_mint",
            &payer.pubkey(),
            FEE_LAMPORTS + MINT_RENT_LAMPORTS,
        )?;

        let mint = Pubkey::new_unique();
        let signature = state.submit(Operation::CreateMint {
            mint,
            mint_authority: *mint_authority,
            decimals,
        });
        Ok(Submitted::new(mint, signature))
    }

    async fn create_associated_token_account(
        &self,
        payer: &Keypair,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Submitted<Pubkey>, LedgerError> {
        const OPERATION: &str = "create_associated_token_account";

        let mut state = self.lock();
        if state.mint(mint).is_none() {
            return Err(LedgerError::rejected(
                OPERATION,
                format!("mint {mint} not found"),
            ));
        }

        let address = associated_token_address(owner, mint);
        let pending_duplicate = state.pending.values().any(|op| {
            matches!(op, Operation::CreateAccount { address: pending, .. } if *pending == address)
        });
        if pending_duplicate || state.token_account(&address).is_some() {
            return Err(LedgerError::rejected(
                OPERATION,
                format!("account {address} already in use"),
            ));
        }

        state.charge(
            OPERATION,
            &payer.pubkey(),
            FEE_LAMPORTS + TOKEN_ACCOUNT_RENT_LAMPORTS,
        )?;

        let signature = state.submit(Operation::CreateAccount {
            address,
            owner: *owner,
            mint: *mint,
        });
        Ok(Submitted::new(address, signature))
    }

    async fn mint_to(
        &self,
        authority: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        amount: u64,
    ) -> Result<Signature, LedgerError> {
        const OPERATION: &str = "mint_to";

        let mut state = self.lock();
        let record = *state
            .mint(mint)
            .ok_or_else(|| LedgerError::rejected(OPERATION, format!("mint {mint} not found")))?;
        if record.mint_authority != authority.pubkey() {
            return Err(LedgerError::rejected(
                OPERATION,
                format!("{} is not the mint authority of {mint}", authority.pubkey()),
            ));
        }

        let account = *state.token_account(destination).ok_or_else(|| {
            LedgerError::rejected(OPERATION, format!("account {destination} not found"))
        })?;
        if account.mint != *mint {
            return Err(LedgerError::rejected(
                OPERATION,
                format!("account {destination} does not hold mint {mint}"),
            ));
        }

        state.charge(OPERATION, &authority.pubkey(), FEE_LAMPORTS)?;

        Ok(state.submit(Operation::MintTo {
            mint: *mint,
            destination: *destination,
            amount,
        }))
    }

    async fn token_balance(&self, account: &Pubkey) -> Result<u64, LedgerError> {
        self.lock()
            .token_account(account)
            .map(|account| account.amount)
            .ok_or_else(|| {
                LedgerError::rejected("token_balance", format!("could not find account {account}"))
            })
    }
}
