mod seeded_balances;

pub use seeded_balances::SeededBalances;
