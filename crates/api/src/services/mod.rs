//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password reset codes
//!
//! Plain CRUD goes straight from the route handlers to the repositories.

pub mod auth;
