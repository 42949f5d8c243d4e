//! Request handlers.
//!
//! Each submodule provides async handler functions for a single resource.
//! Handlers delegate authorization and lifecycle decisions to
//! `audittrack_core`, persistence to `audittrack_db`, and map errors via
//! [`crate::error::AppError`].

pub mod audit;
pub mod auth;
pub mod project;
pub mod user;
