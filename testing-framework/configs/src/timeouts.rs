use std::{env, time::Duration};

use escrow_setup_env as tf_env;

pub const FAUCET_DELAY_SECS: u64 = 5;
pub const MINT_DELAY_SECS: u64 = 2;
pub const CONFIRM_TIMEOUT_SECS: u64 = 90;
pub const CONFIRM_POLL_MILLIS: u64 = 500;
pub const FAUCET_ATTEMPTS: u32 = 5;
pub const FAUCET_BACKOFF_SECS: u64 = 5;
pub const FAUCET_BACKOFF_CAP_SECS: u64 = 60;

fn env_duration(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

fn env_duration_millis(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default))
}

/// Pause before every faucet request.
pub fn faucet_delay() -> Duration {
    env_duration("ESCROW_SETUP_FAUCET_DELAY_SECS", FAUCET_DELAY_SECS)
}

/// Pause before building each token type.
pub fn mint_delay() -> Duration {
    env_duration("ESCROW_SETUP_MINT_DELAY_SECS", MINT_DELAY_SECS)
}

pub fn confirm_timeout() -> Duration {
    crate::adjust_timeout(env_duration(
        "ESCROW_SETUP_CONFIRM_TIMEOUT_SECS",
        CONFIRM_TIMEOUT_SECS,
    ))
}

pub fn confirm_poll_interval() -> Duration {
    env_duration_millis("ESCROW_SETUP_CONFIRM_POLL_MILLIS", CONFIRM_POLL_MILLIS)
}

pub fn faucet_attempts() -> u32 {
    tf_env::escrow_faucet_attempts()
        .filter(|attempts| *attempts > 0)
        .unwrap_or(FAUCET_ATTEMPTS)
}

pub fn faucet_backoff() -> Duration {
    env_duration("ESCROW_SETUP_FAUCET_BACKOFF_SECS", FAUCET_BACKOFF_SECS)
}

pub fn faucet_backoff_cap() -> Duration {
    Duration::from_secs(FAUCET_BACKOFF_CAP_SECS)
}
