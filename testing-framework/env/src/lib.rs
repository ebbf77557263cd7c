use std::{env, path::PathBuf};

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}

#[must_use]
pub fn escrow_rpc_url() -> Option<String> {
    env::var("ESCROW_SETUP_RPC_URL").ok()
}

#[must_use]
pub fn escrow_commitment() -> Option<String> {
    env::var("ESCROW_SETUP_COMMITMENT").ok()
}

#[must_use]
pub fn escrow_keys_dir() -> Option<PathBuf> {
    env::var("ESCROW_SETUP_KEYS_DIR").ok().map(PathBuf::from)
}

#[must_use]
pub fn escrow_address_book() -> Option<PathBuf> {
    env::var("ESCROW_SETUP_ADDRESS_BOOK").ok().map(PathBuf::from)
}

#[must_use]
pub fn escrow_parallel_branches() -> bool {
    env::var("ESCROW_SETUP_PARALLEL_BRANCHES").is_ok_and(|val| val.eq_ignore_ascii_case("true"))
}

#[must_use]
pub fn escrow_faucet_attempts() -> Option<u32> {
    env::var("ESCROW_SETUP_FAUCET_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
}
