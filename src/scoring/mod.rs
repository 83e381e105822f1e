//! Scoring: the identity-keyed points ledger and win streaks.

pub mod ledger;

pub use ledger::{Ledger, LedgerEntry};
