//! Overdue roster derivation.
//!
//! # Responsibility
//! - Join lending transactions against readers and books into the overdue roster.
//! - Narrow the roster for display (search) and for dispatch (selection).
//!
//! # Invariants
//! - Everything here is pure: no I/O, no clock reads, no hidden state.
//! - Transactions that cannot be joined are dropped, never reported as errors.

pub mod builder;
pub mod filter;
pub mod selection;
