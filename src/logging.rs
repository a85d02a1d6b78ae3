use std::fmt;

/// A request-scoped logging interface.
///
/// `PolicyLog` is obtained from [`Ctx::log`](crate::Ctx::log) and is
/// lifetime-bound to the context. Every event carries the request id and,
/// when known, the acting principal's id.
#[derive(Debug)]
pub struct PolicyLog<'a> {
    request_id: &'a str,
    principal_id: Option<&'a str>,
}

impl<'a> PolicyLog<'a> {
    pub(crate) fn new(request_id: &'a str, principal_id: Option<&'a str>) -> Self {
        Self {
            request_id,
            principal_id,
        }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// Use with `format_args!`:
    /// ```
    /// # use featureboard_policy::{Ctx, RequestMeta};
    /// let ctx = Ctx::viewer(RequestMeta::anonymous("req-1"));
    /// ctx.log().info(format_args!("listing {} requests", 3));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(
            request_id = %self.request_id,
            principal = self.principal_id.unwrap_or("<anonymous>"),
            "{}",
            args
        );
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(
            request_id = %self.request_id,
            principal = self.principal_id.unwrap_or("<anonymous>"),
            "{}",
            args
        );
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(
            request_id = %self.request_id,
            principal = self.principal_id.unwrap_or("<anonymous>"),
            "{}",
            args
        );
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(
            request_id = %self.request_id,
            principal = self.principal_id.unwrap_or("<anonymous>"),
            "{}",
            args
        );
    }
}
