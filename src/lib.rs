/// All logic related to one account's transaction history: ledger entries,
/// credits and debits, point-in-time balance lookups.
pub mod account;

/// Pending cashback obligations and the lazy, pull-based schedule that
/// materializes them once their maturity timestamp is reached.
pub mod cashback;

/// Retired-account resolution after merges, with transitive chains.
pub mod merge;

/// The public engine interface, plus the "in memory" implementation
/// coordinating accounts, cashback settlement and merges.
///
/// NOTE: The trait is not strictly needed today, but it keeps an
/// integration point open for swapping the in-memory state for a backed
/// implementation.
pub mod processor;

/// Bootstrap layer for the binary: operation-script parsing and result
/// printing. Lives in the library so the integration tests can drive the
/// same wiring the binary uses.
pub mod bin_utils;
