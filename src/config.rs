use std::fmt;

use serde::Deserialize;

/// Tunables for a [`FeatureBoard`](crate::FeatureBoard).
///
/// Deserializable so a host can load it alongside its own settings; missing
/// fields take their defaults.
///
/// # Examples
///
/// ```
/// use featureboard_policy::BoardConfig;
///
/// let config: BoardConfig = serde_json::from_str(r#"{ "page_size": 20 }"#).unwrap();
/// assert_eq!(config.page_size, 20);
/// assert_eq!(config.title_max_len, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Feature requests per listing page
    pub page_size: usize,
    /// Maximum title length in characters
    pub title_max_len: usize,
    /// Maximum description length in characters
    pub description_max_len: usize,
    /// Audit events kept in memory; older ones are dropped. Zero keeps none.
    pub audit_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            title_max_len: 100,
            description_max_len: 500,
            audit_capacity: 1024,
        }
    }
}

impl BoardConfig {
    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first zero-valued limit.
    /// `audit_capacity` may be zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("page_size", self.page_size),
            ("title_max_len", self.title_max_len),
            ("description_max_len", self.description_max_len),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError { field: *field }),
            None => Ok(()),
        }
    }
}

/// Error returned by [`BoardConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    field: &'static str,
}

impl ConfigError {
    /// Returns the offending field name.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config field '{}' must be greater than zero", self.field)
    }
}

impl std::error::Error for ConfigError {}
