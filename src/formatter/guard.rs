//! Uniform error containment for backends.

use super::{FormatResult, Formatter, FormatterMetadata};
use crate::error::FormatError;
use crate::settings::FormatterSettings;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// A backend wrapped so that it never fails loudly.
///
/// The registry applies this wrapper to every backend at registration
/// time. Availability is probed before each call, backend errors become
/// failed results, and a panic inside the backend is caught and reported
/// as [`FormatErrorKind::BackendFormatFailure`](crate::error::FormatErrorKind::BackendFormatFailure).
#[derive(Clone)]
pub struct GuardedFormatter {
    inner: Arc<dyn Formatter>,
}

impl GuardedFormatter {
    pub fn new(inner: Arc<dyn Formatter>) -> Self {
        Self { inner }
    }

    pub fn metadata(&self) -> &FormatterMetadata {
        self.inner.metadata()
    }

    pub fn id(&self) -> &str {
        &self.inner.metadata().id
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    pub fn inner(&self) -> &Arc<dyn Formatter> {
        &self.inner
    }

    pub async fn format(&self, code: &str, language: &str, settings: &FormatterSettings) -> FormatResult {
        let id = self.id();

        if !self.inner.is_available() {
            log::debug!("Formatter '{id}' is unavailable for {language}");
            return FormatResult::failure(
                code,
                FormatError::unavailable(format!("Formatter '{id}' is not available in this environment")),
            );
        }

        let attempt = AssertUnwindSafe(self.inner.format(code, language, settings))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(formatted)) => FormatResult::success(formatted),
            Ok(Err(err)) => {
                log::warn!("Formatter '{id}' failed for {language}: {err}");
                FormatResult::failure(code, err)
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                log::error!("Formatter '{id}' panicked for {language}: {detail}");
                FormatResult::failure(
                    code,
                    FormatError::format_failure(format!("Formatter '{id}' crashed: {detail}")),
                )
            }
        }
    }
}

impl std::fmt::Debug for GuardedFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedFormatter").field("id", &self.id()).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
