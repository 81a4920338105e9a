//! Domain models for the marketplace.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. They serialize straight to the JSON the API returns.

pub mod comercio;
pub mod favorite;
pub mod product;
pub mod rating;
pub mod session;
pub mod user;

pub use comercio::{Comercio, ComercioChanges, NewComercio};
pub use favorite::FavoriteEntry;
pub use product::{NewProduct, Product, ProductChanges};
pub use rating::{NewRating, ProductRatings, Rating};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User, UserChanges};
