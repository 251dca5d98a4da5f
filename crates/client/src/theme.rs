//! Theme preference resolution and switching.

use std::sync::Arc;

use tracing::{debug, warn};

use mangosteen_core::Theme;

use crate::storage::KeyValueStore;
use crate::ui::{SystemScheme, ThemeSurface};

/// Storage key for the persisted theme choice.
pub const THEME_KEY: &str = "mangosteen_theme";

/// Resolves, applies, and persists the shopper's theme choice.
///
/// Resolution order: the persisted choice, then the platform preference,
/// then light. An unparsable persisted value is discarded and resolves to
/// light; the platform probe only applies when nothing is persisted at all.
#[derive(Clone)]
pub struct ThemeSwitcher {
    storage: Arc<dyn KeyValueStore>,
    system: Arc<dyn SystemScheme>,
    surface: Option<Arc<dyn ThemeSurface>>,
}

impl ThemeSwitcher {
    /// Create a switcher over the given storage and color-scheme probe,
    /// with no surface attached.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, system: Arc<dyn SystemScheme>) -> Self {
        Self {
            storage,
            system,
            surface: None,
        }
    }

    /// Attach the surface that renders the theme.
    #[must_use]
    pub fn with_surface(mut self, surface: Arc<dyn ThemeSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// The theme that should currently be in effect.
    #[must_use]
    pub fn resolve(&self) -> Theme {
        let stored = self.storage.get(THEME_KEY).unwrap_or_else(|err| {
            warn!(error = %err, "theme storage unavailable");
            None
        });

        let Some(raw) = stored else {
            return if self.system.prefers_dark() {
                Theme::Dark
            } else {
                Theme::Light
            };
        };

        match raw.parse::<Theme>() {
            Ok(theme) => theme,
            Err(_) => {
                warn!(stored = %raw, "unrecognized stored theme, falling back to light");
                Theme::Light
            }
        }
    }

    /// Push a theme to the surface without persisting it.
    pub fn apply(&self, theme: Theme) {
        if let Some(surface) = &self.surface {
            surface.apply(theme);
        }
    }

    /// Apply a theme and persist it as the shopper's choice.
    ///
    /// A persistence failure is logged and does not undo the applied theme;
    /// the choice is simply forgotten on the next load.
    pub fn set(&self, theme: Theme) {
        self.apply(theme);
        if let Err(err) = self.storage.set(THEME_KEY, theme.as_str()) {
            warn!(error = %err, theme = %theme, "could not persist theme choice");
        }
        debug!(theme = %theme, "theme set");
    }

    /// Flip the current theme and persist the result. Returns the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.resolve().inverse();
        self.set(next);
        next
    }

    /// Apply the resolved theme and return it.
    ///
    /// Safe to call eagerly before the UI is fully built and again once it
    /// is; applying the same theme twice is harmless.
    pub fn init(&self) -> Theme {
        let theme = self.resolve();
        self.apply(theme);
        theme
    }
}
