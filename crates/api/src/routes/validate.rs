//! Input validation shared by the route handlers.
//!
//! Text is trimmed before any check. Lengths count characters, not bytes.

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::AppError;

/// Maximum length of names (people, comercios, products).
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of descriptions and comments.
pub const MAX_DESCRIPTION_LEN: usize = 500;
/// Maximum length of a street address.
pub const MAX_ADDRESS_LEN: usize = 200;
/// Maximum length of a search term.
pub const MAX_SEARCH_LEN: usize = 100;
/// Maximum length of an image or logo URL.
pub const MAX_URL_LEN: usize = 2048;

/// A required, non-blank text field of at most `max` characters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `field`.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// An optional text field. Blank input counts as absent.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the text is longer than `max`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => required_text(field, text, max).map(Some),
        None => Ok(None),
    }
}

/// An optional absolute http(s) URL. Blank input counts as absent.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the URL is malformed, too long, or
/// uses another scheme.
pub fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if raw.len() > MAX_URL_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_URL_LEN} characters"
        )));
    }
    let url = Url::parse(raw)
        .map_err(|_| AppError::BadRequest(format!("{field} must be a valid URL")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::BadRequest(format!(
            "{field} must be an http or https URL"
        )));
    }
    Ok(Some(url.to_string()))
}

/// A search term of 1 to [`MAX_SEARCH_LEN`] characters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the term is missing, blank or too long.
pub fn search_term(field: &str, value: Option<&str>) -> Result<String, AppError> {
    required_text(field, value.unwrap_or_default(), MAX_SEARCH_LEN)
}

/// A finite latitude in degrees.
///
/// # Errors
///
/// Returns `AppError::BadRequest` outside `-90..=90`.
pub fn latitude(value: f64) -> Result<f64, AppError> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::BadRequest(
            "latitude must be between -90 and 90".to_string(),
        ))
    }
}

/// A finite longitude in degrees.
///
/// # Errors
///
/// Returns `AppError::BadRequest` outside `-180..=180`.
pub fn longitude(value: f64) -> Result<f64, AppError> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::BadRequest(
            "longitude must be between -180 and 180".to_string(),
        ))
    }
}

/// Deserialize a field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: a missing
/// field stays `None`, `null` becomes `Some(None)`.
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validate a clearable text field from a patch body.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if present text is too long.
pub fn patch_text(
    field: &str,
    value: Option<Option<&str>>,
    max: usize,
) -> Result<Option<Option<String>>, AppError> {
    value.map(|inner| optional_text(field, inner, max)).transpose()
}

/// Validate a clearable URL field from a patch body.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if a present URL is invalid.
pub fn patch_url(field: &str, value: Option<Option<&str>>) -> Result<Option<Option<String>>, AppError> {
    value.map(|inner| optional_url(field, inner)).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        icon_url: Option<Option<String>>,
    }

    #[test]
    fn test_required_text_trims_and_limits() {
        assert_eq!(required_text("name", "  Ana  ", 10).unwrap(), "Ana");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdefghijk", 10).is_err());
        // Characters, not bytes
        assert!(required_text("name", "ñññññ", 5).is_ok());
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        assert_eq!(optional_text("d", Some("  "), 5).unwrap(), None);
        assert_eq!(optional_text("d", None, 5).unwrap(), None);
        assert_eq!(optional_text("d", Some(" x "), 5).unwrap(), Some("x".to_owned()));
    }

    #[test]
    fn test_optional_url() {
        assert!(optional_url("logo_url", Some("https://cdn.example.com/a.png")).unwrap().is_some());
        assert!(optional_url("logo_url", Some("ftp://example.com/a.png")).is_err());
        assert!(optional_url("logo_url", Some("not a url")).is_err());
        assert_eq!(optional_url("logo_url", Some("")).unwrap(), None);
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term("nombre", Some(" pan ")).unwrap(), "pan");
        assert!(search_term("nombre", None).is_err());
        assert!(search_term("nombre", Some(&"a".repeat(101))).is_err());
    }

    #[test]
    fn test_coordinates() {
        assert!(latitude(9.93).is_ok());
        assert!(latitude(90.5).is_err());
        assert!(latitude(f64::NAN).is_err());
        assert!(longitude(-84.08).is_ok());
        assert!(longitude(-180.1).is_err());
    }

    #[test]
    fn test_nullable_distinguishes_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.icon_url, None);

        let null: Patch = serde_json::from_str(r#"{"icon_url":null}"#).unwrap();
        assert_eq!(null.icon_url, Some(None));

        let set: Patch = serde_json::from_str(r#"{"icon_url":"https://x.example/i.png"}"#).unwrap();
        assert_eq!(set.icon_url, Some(Some("https://x.example/i.png".to_owned())));
    }

    #[test]
    fn test_patch_url_clears_on_null() {
        assert_eq!(patch_url("icon_url", Some(None)).unwrap(), Some(None));
        assert_eq!(patch_url("icon_url", None).unwrap(), None);
        assert!(patch_url("icon_url", Some(Some("nope"))).is_err());
    }
}
