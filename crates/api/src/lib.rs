//! Reubica API library.
//!
//! The JSON REST server for the Reubica local marketplace, exposed as a
//! library so the CLI can reuse its repositories and password hashing.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
