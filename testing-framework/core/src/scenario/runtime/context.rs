use std::sync::{Arc, Mutex, RwLock};

use escrow_setup_config::SetupTimings;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer as _,
};

use crate::{
    address_book::{AddressBook, AddressBookError, WriteOutcome},
    ledger::LedgerClient,
};

/// End-party identity, known only by its public key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Party {
    label: String,
    pubkey: Pubkey,
}

impl Party {
    #[must_use]
    pub fn new(label: impl Into<String>, pubkey: Pubkey) -> Self {
        Self {
            label: label.into(),
            pubkey,
        }
    }

    /// Key-store label, also the prefix of this party's address slots.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Capitalised label, e.g. `Alice`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.label.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }

    #[must_use]
    pub const fn pubkey(&self) -> &Pubkey {
        &self.pubkey
    }
}

/// The end-parties plus the operator, which signs and pays for everything.
#[derive(Clone)]
pub struct Participants {
    parties: Vec<Party>,
    operator: Arc<Keypair>,
}

impl Participants {
    #[must_use]
    pub fn new(parties: Vec<Party>, operator: Keypair) -> Self {
        Self {
            parties,
            operator: Arc::new(operator),
        }
    }

    #[must_use]
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    #[must_use]
    pub fn operator(&self) -> &Keypair {
        &self.operator
    }

    #[must_use]
    pub fn operator_pubkey(&self) -> Pubkey {
        self.operator.pubkey()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FundingReceipt {
    pub recipient: Pubkey,
    pub lamports: u64,
    pub signature: Signature,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Holding {
    pub party: String,
    pub account: Pubkey,
}

/// Everything created for one token type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenTypeAccounts {
    pub name: String,
    pub mint: Pubkey,
    pub holdings: Vec<Holding>,
}

impl TokenTypeAccounts {
    #[must_use]
    pub fn holding(&self, party: &str) -> Option<Pubkey> {
        self.holdings
            .iter()
            .find(|holding| holding.party == party)
            .map(|holding| holding.account)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BalanceRow {
    pub party: String,
    pub token: String,
    pub account: Pubkey,
    pub amount: u64,
}

#[derive(Default)]
struct Artifacts {
    funded: Vec<FundingReceipt>,
    token_types: Vec<TokenTypeAccounts>,
    balances: Vec<BalanceRow>,
}

/// Shared state handed to every workload and expectation of a run.
pub struct RunContext {
    ledger: Arc<dyn LedgerClient>,
    participants: Participants,
    timings: SetupTimings,
    address_book: Mutex<AddressBook>,
    artifacts: RwLock<Artifacts>,
}

impl RunContext {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        participants: Participants,
        address_book: AddressBook,
        timings: SetupTimings,
    ) -> Self {
        Self {
            ledger,
            participants,
            timings,
            address_book: Mutex::new(address_book),
            artifacts: RwLock::new(Artifacts::default()),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &dyn LedgerClient {
        self.ledger.as_ref()
    }

    #[must_use]
    pub const fn participants(&self) -> &Participants {
        &self.participants
    }

    #[must_use]
    pub const fn timings(&self) -> &SetupTimings {
        &self.timings
    }

    /// Persist `address` under `slot` in the address book.
    pub fn record_address(
        &self,
        slot: &str,
        address: Pubkey,
    ) -> Result<WriteOutcome, AddressBookError> {
        self.address_book
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(slot, address)
    }

    #[must_use]
    pub fn address(&self, slot: &str) -> Option<Pubkey> {
        self.address_book
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(slot)
    }

    pub fn record_funding(&self, receipt: FundingReceipt) {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .funded
            .push(receipt);
    }

    #[must_use]
    pub fn funded(&self) -> Vec<FundingReceipt> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .funded
            .clone()
    }

    pub fn record_token_type(&self, accounts: TokenTypeAccounts) {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .token_types
            .push(accounts);
    }

    /// Token types in the order they finished building.
    #[must_use]
    pub fn token_types(&self) -> Vec<TokenTypeAccounts> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .token_types
            .clone()
    }

    #[must_use]
    pub fn token_type(&self, name: &str) -> Option<TokenTypeAccounts> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .token_types
            .iter()
            .find(|token| token.name == name)
            .cloned()
    }

    pub fn record_balances(&self, rows: Vec<BalanceRow>) {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .balances = rows;
    }

    #[must_use]
    pub fn balances(&self) -> Vec<BalanceRow> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .balances
            .clone()
    }
}
