//! Shopfront Core - Shared domain types.
//!
//! This crate provides the types used across all Shopfront components:
//! - `api` - REST API consumed by the single-page client
//! - `cli` - Command-line tools for migrations, seeding and account bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encoding for the newtypes is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, prices and quantities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
