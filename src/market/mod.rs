//! Market exchange - order books, matching, and price drift

pub mod exchange;
pub mod order;

pub use exchange::{Exchange, Ledger, TransactOutcome};
pub use order::{Order, Side};
