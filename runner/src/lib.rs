pub mod defaults;
pub mod setup;

pub use setup::{load_participants, open_address_book, run_setup, run_with_ledger};
