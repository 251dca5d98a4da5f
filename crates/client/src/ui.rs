//! UI surfaces the embedder implements.
//!
//! Each trait is the smallest slice of the hosting shell a flow needs: a
//! place to show transient notices, a cart count indicator, the page being
//! viewed, the document-level theme output, and the platform color-scheme
//! probe. A browser shell implements them against the DOM; tests use
//! recording fakes.

use std::time::Duration;

use tracing::info;

use mangosteen_core::Theme;

/// How long transient notices stay visible before auto-dismissing.
pub const NOTICE_DISMISS_AFTER: Duration = Duration::from_secs(3);

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// The action completed.
    Success,
    /// The action failed and will not resolve on its own.
    Error,
    /// The action failed but may succeed later.
    Warning,
}

impl NoticeLevel {
    /// Stable lowercase name, matching the notice CSS classes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Transient, toast-style notices shown to the shopper.
///
/// Visual implementations should dismiss each notice after
/// [`NOTICE_DISMISS_AFTER`].
pub trait Notifier: Send + Sync {
    /// Show a notice.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Notifier that only writes to the log, for embedders with no notice UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        info!(level = level.as_str(), "{message}");
    }
}

/// Cart count indicator.
///
/// A count of 0 hides the indicator; a positive count shows it with the
/// number. The guest cart refreshes it after every mutation.
pub trait CartBadge: Send + Sync {
    /// Render the given total unit count.
    fn refresh(&self, count: u32);
}

/// The page (or screen) hosting the storefront UI.
pub trait PageHandle: Send + Sync {
    /// Current path, e.g. `/cart` or `/products/42`.
    fn path(&self) -> String;

    /// Request a full refresh so the next render reflects server state.
    fn reload(&self);
}

/// Page handle for embedders without a reloadable page.
///
/// The path is fixed at construction and a reload request only logs.
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    path: String,
}

impl HeadlessPage {
    /// Create a handle reporting the given path.
    #[must_use]
    pub fn at(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::at("/")
    }
}

impl PageHandle for HeadlessPage {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn reload(&self) {
        info!(path = %self.path, "page reload requested");
    }
}

/// Document-level theme output: the root marker the stylesheet keys off
/// plus whatever toggle control shows the current state.
pub trait ThemeSurface: Send + Sync {
    /// Render the given theme. Applying the current theme again must be
    /// harmless.
    fn apply(&self, theme: Theme);
}

/// Probe for the platform's preferred color scheme.
pub trait SystemScheme: Send + Sync {
    /// Whether the platform prefers a dark presentation.
    fn prefers_dark(&self) -> bool;
}

/// Probe for platforms with no detectable preference.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSystemScheme;

impl SystemScheme for NoSystemScheme {
    fn prefers_dark(&self) -> bool {
        false
    }
}
