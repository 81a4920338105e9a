//! Favorite targets.
//!
//! A user can favorite either a product or a whole comercio. The target is
//! modeled as an enum so a favorite can never point at both, or at neither.

use serde::{Deserialize, Serialize};

use super::id::{ComercioId, ProductId};

/// Kind of thing a favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    Producto,
    Comercio,
}

impl std::fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Producto => f.write_str("producto"),
            Self::Comercio => f.write_str("comercio"),
        }
    }
}

impl std::str::FromStr for FavoriteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "producto" => Ok(Self::Producto),
            "comercio" => Ok(Self::Comercio),
            _ => Err(format!("invalid favorite kind: {s}")),
        }
    }
}

/// Errors building a [`FavoriteTarget`] from loose request fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FavoriteTargetError {
    #[error("{0} favorites require {1}")]
    MissingId(FavoriteKind, &'static str),
    #[error("{0} favorites must not include {1}")]
    UnexpectedId(FavoriteKind, &'static str),
}

/// The concrete product or comercio a favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FavoriteTarget {
    Producto { product_id: ProductId },
    Comercio { comercio_id: ComercioId },
}

impl FavoriteTarget {
    /// Build a target from a kind and the two optional ids a client sent.
    ///
    /// Exactly the id matching `kind` must be present.
    ///
    /// # Errors
    ///
    /// Returns [`FavoriteTargetError`] when the matching id is missing or
    /// the other one is present.
    pub fn from_parts(
        kind: FavoriteKind,
        product_id: Option<ProductId>,
        comercio_id: Option<ComercioId>,
    ) -> Result<Self, FavoriteTargetError> {
        match (kind, product_id, comercio_id) {
            (FavoriteKind::Producto, Some(product_id), None) => Ok(Self::Producto { product_id }),
            (FavoriteKind::Comercio, None, Some(comercio_id)) => {
                Ok(Self::Comercio { comercio_id })
            }
            (FavoriteKind::Producto, _, Some(_)) => {
                Err(FavoriteTargetError::UnexpectedId(kind, "comercio_id"))
            }
            (FavoriteKind::Comercio, Some(_), _) => {
                Err(FavoriteTargetError::UnexpectedId(kind, "product_id"))
            }
            (FavoriteKind::Producto, None, None) => {
                Err(FavoriteTargetError::MissingId(kind, "product_id"))
            }
            (FavoriteKind::Comercio, None, None) => {
                Err(FavoriteTargetError::MissingId(kind, "comercio_id"))
            }
        }
    }

    #[must_use]
    pub const fn kind(self) -> FavoriteKind {
        match self {
            Self::Producto { .. } => FavoriteKind::Producto,
            Self::Comercio { .. } => FavoriteKind::Comercio,
        }
    }

    #[must_use]
    pub const fn product_id(self) -> Option<ProductId> {
        match self {
            Self::Producto { product_id } => Some(product_id),
            Self::Comercio { .. } => None,
        }
    }

    #[must_use]
    pub const fn comercio_id(self) -> Option<ComercioId> {
        match self {
            Self::Comercio { comercio_id } => Some(comercio_id),
            Self::Producto { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_id_builds_target() {
        let product_id = ProductId::generate();
        let target = FavoriteTarget::from_parts(FavoriteKind::Producto, Some(product_id), None)
            .unwrap();
        assert_eq!(target.kind(), FavoriteKind::Producto);
        assert_eq!(target.product_id(), Some(product_id));
        assert_eq!(target.comercio_id(), None);
    }

    #[test]
    fn test_other_id_is_rejected() {
        let err = FavoriteTarget::from_parts(
            FavoriteKind::Comercio,
            Some(ProductId::generate()),
            Some(ComercioId::generate()),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FavoriteTargetError::UnexpectedId(FavoriteKind::Comercio, "product_id")
        );
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert_eq!(
            FavoriteTarget::from_parts(FavoriteKind::Comercio, None, None),
            Err(FavoriteTargetError::MissingId(
                FavoriteKind::Comercio,
                "comercio_id"
            ))
        );
    }

    #[test]
    fn test_error_message_names_fields() {
        let err = FavoriteTargetError::UnexpectedId(FavoriteKind::Producto, "comercio_id");
        assert_eq!(err.to_string(), "producto favorites must not include comercio_id");
    }

    #[test]
    fn test_kind_parses() {
        assert_eq!("Comercio".parse::<FavoriteKind>(), Ok(FavoriteKind::Comercio));
        assert!("tienda".parse::<FavoriteKind>().is_err());
    }
}
