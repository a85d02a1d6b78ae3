use std::fmt;

use crate::config::BoardConfig;
use crate::model::{NewFeatureRequest, NewRequestBody, Status, StatusBody};
use crate::query::{ListQuery, RawListQuery, Timeframe};
use crate::{Tainted, Verified};

/// Error returned when sanitization fails.
///
/// Messages describe which rule was broken, never the rejected value.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{SanitizationError, SanitizationErrorKind};
///
/// let error = SanitizationError::new(SanitizationErrorKind::TooLong, "title too long");
/// assert_eq!(error.kind(), SanitizationErrorKind::TooLong);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn missing(field: &str) -> Self {
        Self::new(
            SanitizationErrorKind::Missing,
            format!("{} is required", field),
        )
    }

    fn in_field(self, field: &str) -> Self {
        Self {
            kind: self.kind,
            message: format!("{}: {}", field, self.message),
        }
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// A required field was absent.
    Missing,
    /// Input is empty or contains only whitespace.
    Empty,
    /// Input exceeds maximum allowed length.
    TooLong,
    /// Input contains control or non-printable characters.
    ContainsControlChars,
    /// Input is not one of the enumerated values.
    UnknownValue,
    /// Input format is malformed.
    MalformedInput,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing field"),
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ContainsControlChars => write!(f, "contains control characters"),
            Self::UnknownValue => write!(f, "unknown value"),
            Self::MalformedInput => write!(f, "malformed input"),
        }
    }
}

/// Converts tainted values into verified values.
///
/// Implementations must validate before calling `Verified::new_unchecked`
/// and must not echo the rejected input in their errors.
pub trait Sanitizer<T, U = T> {
    /// Sanitizes a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<T>) -> Result<Verified<U>, SanitizationError>;
}

/// Sanitizer for free text such as titles, descriptions and search terms.
///
/// - Trims leading and trailing whitespace
/// - Rejects empty strings (after trimming)
/// - Rejects control characters; multiline mode still allows `\n`, `\r`, `\t`
/// - Enforces a maximum length in characters
///
/// # Examples
///
/// ```
/// use featureboard_policy::{Tainted, Sanitizer, TextSanitizer};
///
/// let title = TextSanitizer::single_line(100);
/// let verified = title.sanitize(Tainted::new("  Dark mode  ".to_string())).unwrap();
/// assert_eq!(verified.as_ref(), "Dark mode");
///
/// assert!(title.sanitize(Tainted::new("two\nlines".to_string())).is_err());
///
/// let description = TextSanitizer::multiline(500);
/// assert!(description.sanitize(Tainted::new("two\nlines".to_string())).is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextSanitizer {
    max_len: usize,
    multiline: bool,
}

impl TextSanitizer {
    /// A sanitizer rejecting every control character.
    pub fn single_line(max_len: usize) -> Self {
        Self {
            max_len,
            multiline: false,
        }
    }

    /// A sanitizer allowing line breaks and tabs.
    pub fn multiline(max_len: usize) -> Self {
        Self {
            max_len,
            multiline: true,
        }
    }

    fn is_forbidden_char(&self, c: char) -> bool {
        if self.multiline && matches!(c, '\n' | '\r' | '\t') {
            return false;
        }
        c.is_control()
    }
}

impl Sanitizer<String> for TextSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let raw = input.into_inner();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "input is empty or contains only whitespace",
            ));
        }

        if trimmed.chars().any(|c| self.is_forbidden_char(c)) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ContainsControlChars,
                "input contains control or non-printable characters",
            ));
        }

        if trimmed.chars().count() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("input exceeds maximum length of {}", self.max_len),
            ));
        }

        Ok(Verified::new_unchecked(trimmed.to_string()))
    }
}

/// Sanitizer for status names.
///
/// Accepts exactly `pending`, `planned`, `completed` or `rejected` after
/// trimming surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusSanitizer;

impl Sanitizer<String, Status> for StatusSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<Status>, SanitizationError> {
        let raw = input.into_inner();
        raw.trim()
            .parse::<Status>()
            .map(Verified::new_unchecked)
            .map_err(|e| SanitizationError::new(SanitizationErrorKind::UnknownValue, e.to_string()))
    }
}

impl Sanitizer<StatusBody, Status> for StatusSanitizer {
    fn sanitize(&self, input: Tainted<StatusBody>) -> Result<Verified<Status>, SanitizationError> {
        let status = input.into_inner().status.ok_or_else(|| SanitizationError::missing("status"))?;
        self.sanitize(Tainted::new(status))
    }
}

/// Sanitizer for resource ids taken from the request path.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdSanitizer;

impl IdSanitizer {
    const MAX_LEN: usize = 128;
}

impl Sanitizer<String> for IdSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        TextSanitizer::single_line(Self::MAX_LEN)
            .sanitize(input)
            .map_err(|e| e.in_field("id"))
    }
}

/// Sanitizer turning a create body into a [`NewFeatureRequest`].
#[derive(Debug, Clone, Copy)]
pub struct NewRequestSanitizer {
    title: TextSanitizer,
    description: TextSanitizer,
}

impl NewRequestSanitizer {
    /// Builds the sanitizer with the limits in `config`.
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            title: TextSanitizer::single_line(config.title_max_len),
            description: TextSanitizer::multiline(config.description_max_len),
        }
    }
}

impl Default for NewRequestSanitizer {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}

impl Sanitizer<NewRequestBody, NewFeatureRequest> for NewRequestSanitizer {
    fn sanitize(
        &self,
        input: Tainted<NewRequestBody>,
    ) -> Result<Verified<NewFeatureRequest>, SanitizationError> {
        let NewRequestBody { title, description } = input.into_inner();

        let title = title.ok_or_else(|| SanitizationError::missing("title"))?;
        let description = description.ok_or_else(|| SanitizationError::missing("description"))?;

        let title = self
            .title
            .sanitize(Tainted::new(title))
            .map_err(|e| e.in_field("title"))?;
        let description = self
            .description
            .sanitize(Tainted::new(description))
            .map_err(|e| e.in_field("description"))?;

        Ok(Verified::new_unchecked(NewFeatureRequest {
            title: title.into_inner(),
            description: description.into_inner(),
        }))
    }
}

/// Sanitizer turning query-string parameters into a [`ListQuery`].
///
/// `all` (or an absent value) disables the status and timeframe filters;
/// an empty search is ignored.
///
/// # Examples
///
/// ```
/// use featureboard_policy::{ListQuerySanitizer, RawListQuery, Sanitizer, Status, Tainted};
///
/// let raw = RawListQuery {
///     status: Some("planned".to_string()),
///     search: Some("  Dark ".to_string()),
///     ..RawListQuery::default()
/// };
/// let query = ListQuerySanitizer.sanitize(Tainted::new(raw)).unwrap().into_inner();
/// assert_eq!(query.status, Some(Status::Planned));
/// assert_eq!(query.search.as_deref(), Some("dark"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ListQuerySanitizer;

impl ListQuerySanitizer {
    const SEARCH_MAX_LEN: usize = 100;

    fn non_trivial(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && v != "all")
    }
}

impl Sanitizer<RawListQuery, ListQuery> for ListQuerySanitizer {
    fn sanitize(
        &self,
        input: Tainted<RawListQuery>,
    ) -> Result<Verified<ListQuery>, SanitizationError> {
        let raw = input.into_inner();

        let status = Self::non_trivial(raw.status)
            .map(|s| StatusSanitizer.sanitize(Tainted::new(s)).map(Verified::into_inner))
            .transpose()
            .map_err(|e| e.in_field("status"))?;

        let timeframe = Self::non_trivial(raw.timeframe)
            .map(|t| {
                t.parse::<Timeframe>().map_err(|e| {
                    SanitizationError::new(SanitizationErrorKind::UnknownValue, e.to_string())
                })
            })
            .transpose()
            .map_err(|e| e.in_field("timeframe"))?;

        let search = match raw.search.filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(
                TextSanitizer::single_line(Self::SEARCH_MAX_LEN)
                    .sanitize(Tainted::new(s))
                    .map_err(|e| e.in_field("search"))?
                    .into_inner()
                    .to_lowercase(),
            ),
            None => None,
        };

        let mine = match Self::non_trivial(raw.filter).as_deref() {
            None => false,
            Some("mine") => true,
            Some(_) => {
                return Err(SanitizationError::new(
                    SanitizationErrorKind::UnknownValue,
                    "filter must be 'mine' or 'all'",
                ))
            }
        };

        let page = match raw.page.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.parse::<usize>().map_err(|_| {
                SanitizationError::new(
                    SanitizationErrorKind::MalformedInput,
                    "page must be a non-negative integer",
                )
            })?,
            None => 0,
        };

        Ok(Verified::new_unchecked(ListQuery {
            status,
            timeframe,
            search,
            mine,
            page,
        }))
    }
}
