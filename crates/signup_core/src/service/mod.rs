//! Use-case services of the sign-up desk.
//!
//! # Responsibility
//! - Hold each piece of mutable state behind a small service type.
//! - Compose them in `desk::SignupDesk`, the only entry point that mutates.

pub mod desk;
pub mod feed_service;
pub mod feedback_service;
pub mod gate_service;
pub mod registration_service;
pub mod registry_service;
