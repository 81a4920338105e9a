//! Core types for Reubica.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod favorite;
pub mod id;
pub mod password;
pub mod phone;
pub mod price;
pub mod rating;
pub mod reset_code;
pub mod role;

pub use category::{
    CategoryError, CategoryListing, CategorySelection, PrincipalCategory, categories_for, taxonomy,
};
pub use email::{Email, EmailError};
pub use favorite::{FavoriteKind, FavoriteTarget, FavoriteTargetError};
pub use id::*;
pub use password::{PasswordError, validate_password, validate_password_pair};
pub use phone::{Phone, PhoneError};
pub use price::{Price, PriceError};
pub use rating::{RatingError, RatingScore};
pub use reset_code::{RESET_CODE_LENGTH, ResetCode, ResetCodeError};
pub use role::UserRole;
