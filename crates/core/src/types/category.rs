//! Two-level storefront taxonomy.
//!
//! A comercio declares one or more principal categories and one or more
//! secondary categories. Every secondary must be listed under at least one
//! of the principals the comercio declared.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating a category selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown principal category: {0}")]
    UnknownPrincipal(String),
    #[error("at least one principal category is required")]
    NoPrincipal,
    #[error("at least one secondary category is required")]
    NoSecondary,
    #[error("secondary category \"{0}\" does not belong to any selected principal category")]
    SecondaryMismatch(String),
}

/// Top-level storefront category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalCategory {
    Ropa,
    Alimentos,
    Comida,
    Higiene,
    Artesanias,
    Libreria,
    Servicios,
}

impl PrincipalCategory {
    /// Every principal category, in display order.
    pub const ALL: [Self; 7] = [
        Self::Ropa,
        Self::Alimentos,
        Self::Comida,
        Self::Higiene,
        Self::Artesanias,
        Self::Libreria,
        Self::Servicios,
    ];

    /// Stored slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Ropa => "ropa",
            Self::Alimentos => "alimentos",
            Self::Comida => "comida",
            Self::Higiene => "higiene",
            Self::Artesanias => "artesanias",
            Self::Libreria => "libreria",
            Self::Servicios => "servicios",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ropa => "Ropa",
            Self::Alimentos => "Alimentos",
            Self::Comida => "Comida",
            Self::Higiene => "Higiene",
            Self::Artesanias => "Artesanías",
            Self::Libreria => "Librería",
            Self::Servicios => "Servicios",
        }
    }

    /// Canonical secondary labels listed under this principal.
    #[must_use]
    pub const fn secondaries(self) -> &'static [&'static str] {
        match self {
            Self::Ropa => &[
                "Ropa de segunda mano",
                "Vestidos",
                "Accesorios",
                "Calzado",
                "Ropa variada",
                "Otros",
            ],
            Self::Alimentos => &[
                "Frutas",
                "Verduras",
                "Lácteos",
                "Productos enlatados",
                "Snacks",
                "Dulces típicos",
                "Otros",
            ],
            Self::Comida => &[
                "Pizzas",
                "Hamburguesas",
                "Comida mexicana",
                "Comida asiática",
                "Postres",
                "Carnes",
                "Pescados y mariscos",
                "Comida saludable",
                "Hot Dogs",
                "Cafetería",
                "Otros",
            ],
            Self::Higiene => &[
                "Jabones",
                "Shampoos",
                "Productos dentales",
                "Desodorantes",
                "Productos femeninos",
                "Otros",
            ],
            Self::Artesanias => &[
                "Cerámica",
                "Tejidos",
                "Joyería artesanal",
                "Cuadros",
                "Muebles",
                "Otros",
            ],
            Self::Libreria => &[
                "Libros infantiles",
                "Novelas",
                "Papelería",
                "Material escolar",
                "Revistas",
                "Otros",
            ],
            Self::Servicios => &[
                "Reparación electrónica",
                "Limpieza",
                "Transporte",
                "Consultoría",
                "Educación",
                "Otros",
            ],
        }
    }

    /// Parse a principal category, ignoring case, surrounding whitespace,
    /// and Spanish accents.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::UnknownPrincipal`] for anything else.
    pub fn parse(s: &str) -> Result<Self, CategoryError> {
        let folded = fold(s);
        Self::ALL
            .into_iter()
            .find(|p| p.slug() == folded)
            .ok_or_else(|| CategoryError::UnknownPrincipal(s.trim().to_owned()))
    }

    /// Canonical label of `secondary` if it is listed under this principal.
    #[must_use]
    pub fn canonical_secondary(self, secondary: &str) -> Option<&'static str> {
        let folded = fold(secondary);
        self.secondaries()
            .iter()
            .copied()
            .find(|label| fold(label) == folded)
    }
}

impl std::fmt::Display for PrincipalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for PrincipalCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lower-case and strip the accents used in Spanish so that
/// "Librería", "libreria" and "LIBRERIA" compare equal.
fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// A validated, deduplicated category selection in canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    principals: Vec<PrincipalCategory>,
    secondaries: Vec<String>,
}

impl CategorySelection {
    /// Validate raw principal and secondary category names.
    ///
    /// Order of first appearance is kept; duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first [`CategoryError`] found. Errors name the offending
    /// value so clients can point at it.
    pub fn validate<P, S>(principals: &[P], secondaries: &[S]) -> Result<Self, CategoryError>
    where
        P: AsRef<str>,
        S: AsRef<str>,
    {
        let mut parsed: Vec<PrincipalCategory> = Vec::with_capacity(principals.len());
        for raw in principals {
            let principal = PrincipalCategory::parse(raw.as_ref())?;
            if !parsed.contains(&principal) {
                parsed.push(principal);
            }
        }
        if parsed.is_empty() {
            return Err(CategoryError::NoPrincipal);
        }

        let mut canonical: Vec<String> = Vec::with_capacity(secondaries.len());
        for raw in secondaries {
            let raw = raw.as_ref();
            let label = parsed
                .iter()
                .find_map(|p| p.canonical_secondary(raw))
                .ok_or_else(|| CategoryError::SecondaryMismatch(raw.trim().to_owned()))?;
            if !canonical.iter().any(|existing| existing == label) {
                canonical.push(label.to_owned());
            }
        }
        if canonical.is_empty() {
            return Err(CategoryError::NoSecondary);
        }

        Ok(Self {
            principals: parsed,
            secondaries: canonical,
        })
    }

    #[must_use]
    pub fn principals(&self) -> &[PrincipalCategory] {
        &self.principals
    }

    #[must_use]
    pub fn secondaries(&self) -> &[String] {
        &self.secondaries
    }

    /// Principal slugs, as stored in the database.
    #[must_use]
    pub fn principal_slugs(&self) -> Vec<String> {
        self.principals.iter().map(|p| p.slug().to_owned()).collect()
    }
}

/// One entry of the public taxonomy listing.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub slug: &'static str,
    pub label: &'static str,
    pub secondaries: &'static [&'static str],
}

/// Listing entry for a single principal category.
#[must_use]
pub fn categories_for(principal: PrincipalCategory) -> CategoryListing {
    CategoryListing {
        slug: principal.slug(),
        label: principal.label(),
        secondaries: principal.secondaries(),
    }
}

/// The whole taxonomy, in display order.
#[must_use]
pub fn taxonomy() -> Vec<CategoryListing> {
    PrincipalCategory::ALL.into_iter().map(categories_for).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_accents_and_case() {
        assert_eq!(
            PrincipalCategory::parse("Librería"),
            Ok(PrincipalCategory::Libreria)
        );
        assert_eq!(
            PrincipalCategory::parse("  ARTESANIAS "),
            Ok(PrincipalCategory::Artesanias)
        );
        assert_eq!(
            PrincipalCategory::parse("artesanías"),
            Ok(PrincipalCategory::Artesanias)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            PrincipalCategory::parse("ferreteria"),
            Err(CategoryError::UnknownPrincipal("ferreteria".to_owned()))
        );
    }

    #[test]
    fn test_selection_canonicalizes_and_dedups() {
        let selection = CategorySelection::validate(
            &["comida", "Comida", "ropa"],
            &["pizzas", "CAFETERIA", "Pizzas", "calzado"],
        )
        .unwrap();
        assert_eq!(
            selection.principals(),
            &[PrincipalCategory::Comida, PrincipalCategory::Ropa]
        );
        assert_eq!(selection.secondaries(), &["Pizzas", "Cafetería", "Calzado"]);
        assert_eq!(selection.principal_slugs(), vec!["comida", "ropa"]);
    }

    #[test]
    fn test_secondary_must_belong_to_a_selected_principal() {
        let err = CategorySelection::validate(&["ropa"], &["Pizzas"]).unwrap_err();
        assert_eq!(err, CategoryError::SecondaryMismatch("Pizzas".to_owned()));
    }

    #[test]
    fn test_shared_secondary_is_accepted_once() {
        let selection =
            CategorySelection::validate(&["higiene", "servicios"], &["Otros", "otros"]).unwrap();
        assert_eq!(selection.secondaries(), &["Otros"]);
    }

    #[test]
    fn test_empty_lists() {
        let none: [&str; 0] = [];
        assert_eq!(
            CategorySelection::validate(&none, &["Pizzas"]),
            Err(CategoryError::NoPrincipal)
        );
        assert_eq!(
            CategorySelection::validate(&["comida"], &none),
            Err(CategoryError::NoSecondary)
        );
    }

    #[test]
    fn test_taxonomy_lists_every_principal() {
        let listing = taxonomy();
        assert_eq!(listing.len(), PrincipalCategory::ALL.len());
        assert!(listing.iter().all(|entry| entry.secondaries.contains(&"Otros")));
    }
}
