use std::{fmt, ops::Mul as _, path::PathBuf, str::FromStr, sync::LazyLock, time::Duration};

use escrow_setup_env as tf_env;

pub mod constants;
pub mod timeouts;

static IS_SLOW_TEST_ENV: LazyLock<bool> = LazyLock::new(tf_env::slow_test_env);

const SLOW_ENV_TIMEOUT_MULTIPLIER: u32 = 2;

/// In slow test environments like Codecov, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV {
        d.mul(SLOW_ENV_TIMEOUT_MULTIPLIER)
    } else {
        d
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown commitment level '{0}' (expected processed, confirmed or finalized)")]
    UnknownCommitment(String),
}

/// Commitment level the ledger must reach before a step counts as confirmed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(ConfigError::UnknownCommitment(other.to_owned())),
        }
    }
}

/// Pauses, confirmation horizon and faucet retry budget.
#[derive(Clone, Copy, Debug)]
pub struct SetupTimings {
    pub faucet_delay: Duration,
    pub mint_delay: Duration,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
    pub faucet_attempts: u32,
    pub faucet_backoff: Duration,
    pub faucet_backoff_cap: Duration,
}

impl SetupTimings {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            faucet_delay: timeouts::faucet_delay(),
            mint_delay: timeouts::mint_delay(),
            confirm_timeout: timeouts::confirm_timeout(),
            confirm_poll_interval: timeouts::confirm_poll_interval(),
            faucet_attempts: timeouts::faucet_attempts(),
            faucet_backoff: timeouts::faucet_backoff(),
            faucet_backoff_cap: timeouts::faucet_backoff_cap(),
        }
    }

    /// No pauses at all; used against in-process ledgers.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            faucet_delay: Duration::ZERO,
            mint_delay: Duration::ZERO,
            confirm_timeout: Duration::from_secs(5),
            confirm_poll_interval: Duration::from_millis(10),
            faucet_attempts: timeouts::FAUCET_ATTEMPTS,
            faucet_backoff: Duration::ZERO,
            faucet_backoff_cap: Duration::ZERO,
        }
    }
}

impl Default for SetupTimings {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Everything the setup binary needs to reach the network and its key material.
#[derive(Clone, Debug)]
pub struct SetupConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    pub keys_dir: PathBuf,
    pub address_book: PathBuf,
    /// Also write `<slot>_pub.json` files next to the address book.
    pub slot_files: bool,
    pub parallel_branches: bool,
    pub timings: SetupTimings,
}

impl SetupConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let commitment = tf_env::escrow_commitment()
            .map(|raw| raw.parse::<Commitment>())
            .transpose()?
            .unwrap_or(constants::DEFAULT_COMMITMENT);
        let keys_dir = constants::keys_dir();
        let address_book = tf_env::escrow_address_book()
            .unwrap_or_else(|| keys_dir.join(constants::DEFAULT_ADDRESS_BOOK_FILE));

        Ok(Self {
            rpc_url: constants::rpc_url(),
            commitment,
            keys_dir,
            address_book,
            slot_files: true,
            parallel_branches: tf_env::escrow_parallel_branches(),
            timings: SetupTimings::from_env(),
        })
    }

    /// Config rooted at `keys_dir` with no pauses; the RPC URL is left at the
    /// default and only matters when an RPC ledger is built from it.
    #[must_use]
    pub fn local(keys_dir: impl Into<PathBuf>) -> Self {
        let keys_dir = keys_dir.into();
        Self {
            rpc_url: constants::DEFAULT_RPC_URL.to_owned(),
            commitment: constants::DEFAULT_COMMITMENT,
            address_book: keys_dir.join(constants::DEFAULT_ADDRESS_BOOK_FILE),
            keys_dir,
            slot_files: true,
            parallel_branches: false,
            timings: SetupTimings::immediate(),
        }
    }
}
