//! Reubica Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Reubica components:
//! - `api` - The marketplace REST server
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Everything here can be unit tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, phones, prices, ratings,
//!   roles, reset codes and the category taxonomy
//! - [`access`] - Role and ownership rules shared by every endpoint

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{AccessDenied, Actor};
pub use types::*;
