//! Domain model for the sign-up desk.
//!
//! # Responsibility
//! - Define the persisted account and notification records.
//! - Define the submission draft and transient feedback shapes.
//!
//! # Invariants
//! - No outbound shape carries the credential derivative.
//! - Notifications are value snapshots, never live references to accounts.

pub mod account;
pub mod feedback;
pub mod form;
pub mod notification;
