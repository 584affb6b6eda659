//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads into the overdue roster and desk statistics.
//! - Orchestrate notice dispatch and own the per-session send history.
//! - Keep front ends (CLI) decoupled from transport details.

pub mod notification_service;
pub mod roster_service;
