use std::fmt;

use escrow_setup_core::scenario::{BalanceRow, RunContext};

/// Final balances, one column per (party, token type) in collection order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BalanceReport {
    rows: Vec<BalanceRow>,
}

impl BalanceReport {
    #[must_use]
    pub const fn new(rows: Vec<BalanceRow>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn from_context(ctx: &RunContext) -> Self {
        Self::new(ctx.balances())
    }

    #[must_use]
    pub fn rows(&self) -> &[BalanceRow] {
        &self.rows
    }

    #[must_use]
    pub fn amount(&self, party: &str, token: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|row| row.party == party && row.token == token)
            .map(|row| row.amount)
    }

    fn columns(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .map(|row| {
                (
                    format!("{} Token Account {}", capitalise(&row.party), row.token),
                    row.amount.to_string(),
                )
            })
            .collect()
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.columns();
        if columns.is_empty() {
            return writeln!(f, "(no balances)");
        }

        let widths: Vec<usize> = columns
            .iter()
            .map(|(header, value)| header.chars().count().max(value.chars().count()))
            .collect();

        let rule = |left: char, mid: char, right: char| {
            let inner = widths
                .iter()
                .map(|width| "─".repeat(width + 2))
                .collect::<Vec<_>>()
                .join(&mid.to_string());
            format!("{left}{inner}{right}")
        };

        writeln!(f, "{}", rule('┌', '┬', '┐'))?;
        write!(f, "│")?;
        for ((header, _), width) in columns.iter().zip(&widths) {
            write!(f, " {header:^width$} │")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('├', '┼', '┤'))?;
        write!(f, "│")?;
        for ((_, value), width) in columns.iter().zip(&widths) {
            write!(f, " {value:^width$} │")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", rule('└', '┴', '┘'))
    }
}

fn capitalise(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
