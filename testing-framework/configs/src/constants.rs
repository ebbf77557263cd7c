use std::path::PathBuf;

use escrow_setup_env as tf_env;

use crate::Commitment;

/// Public devnet RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Commitment used for every submission, confirmation and query.
pub const DEFAULT_COMMITMENT: Commitment = Commitment::Confirmed;

/// Directory holding `alice`, `bob` and `id` key material.
pub const DEFAULT_KEYS_DIR: &str = "keys";

/// File name of the address book inside the keys directory.
pub const DEFAULT_ADDRESS_BOOK_FILE: &str = "addresses.json";

/// Native currency requested per identity from the faucet, in whole SOL.
pub const AIRDROP_SOL: u64 = 2;

/// Token units minted into each seeded holding account.
pub const SEED_AMOUNT: u64 = 50;

/// Decimal precision of every mint created by the setup.
pub const MINT_DECIMALS: u8 = 0;

pub const ALICE_LABEL: &str = "alice";
pub const BOB_LABEL: &str = "bob";
pub const OPERATOR_LABEL: &str = "id";

pub const TOKEN_X: &str = "X";
pub const TOKEN_Y: &str = "Y";

/// Resolve the RPC endpoint from `ESCROW_SETUP_RPC_URL`, falling back to devnet.
pub fn rpc_url() -> String {
    tf_env::escrow_rpc_url().unwrap_or_else(|| DEFAULT_RPC_URL.to_owned())
}

/// Resolve the keys directory from `ESCROW_SETUP_KEYS_DIR`.
pub fn keys_dir() -> PathBuf {
    tf_env::escrow_keys_dir().unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_DIR))
}
