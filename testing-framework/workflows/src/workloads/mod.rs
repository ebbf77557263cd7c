pub mod funding;
pub mod token_type;
pub mod util;

pub use funding::FUNDING_WORKLOAD;
pub use token_type::{Seed, build_token_type, seed_balance};
