//! Domain logic for the audit-tracking platform.
//!
//! Everything in this crate is pure: no I/O, no database handles. The
//! lifecycle engine in [`audit`] makes every authorization and transition
//! decision; the `db` and `api` crates only load, delegate, and persist.

pub mod audit;
pub mod error;
pub mod roles;
pub mod stakeholders;
pub mod types;
