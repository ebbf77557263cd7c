pub mod address_book;
pub mod keys;
pub mod ledger;
pub mod retry;
pub mod scenario;

pub use escrow_setup_config::{SetupConfig, SetupTimings, adjust_timeout};
