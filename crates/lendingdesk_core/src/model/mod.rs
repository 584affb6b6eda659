//! Domain model for the lending desk.
//!
//! # Responsibility
//! - Define the records exchanged with the library backend.
//! - Define the derived, ephemeral projections (overdue roster, send history).
//!
//! # Invariants
//! - Backend records are identified by the opaque string id the backend issues.
//! - Derived projections are rebuilt on demand and never persisted.

pub mod archive;
pub mod book;
pub mod lending;
pub mod notification;
pub mod overdue;
pub mod reader;
pub mod timestamp;
