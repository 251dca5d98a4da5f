//! Theme commands.
//!
//! The persisted theme lives in the same JSON file store as the guest cart,
//! under its own key.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use mangosteen_client::storage::{JsonFileStore, StorageError};
use mangosteen_client::theme::ThemeSwitcher;
use mangosteen_client::ui::NoSystemScheme;
use mangosteen_core::Theme;

/// Errors that can occur during theme commands.
#[derive(Debug, Error)]
pub enum ThemeCommandError {
    /// The theme argument is not a known theme name.
    #[error("invalid theme: {0} (valid themes: dark, light)")]
    InvalidTheme(String),

    /// No storage location could be determined.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Open a theme switcher over the configured JSON file store.
///
/// There is no OS color scheme to probe from a terminal, so an unset theme
/// resolves to the default.
fn open_switcher() -> Result<ThemeSwitcher, ThemeCommandError> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let store = match std::env::var("MANGOSTEEN_STORAGE_PATH") {
        Ok(path) => JsonFileStore::new(path),
        Err(_) => JsonFileStore::with_default_path()?,
    };
    Ok(ThemeSwitcher::new(Arc::new(store), Arc::new(NoSystemScheme)))
}

/// Print the effective theme.
///
/// # Errors
///
/// Returns an error if no storage location could be determined.
#[allow(clippy::print_stdout)]
pub fn get() -> Result<(), ThemeCommandError> {
    println!("{}", open_switcher()?.resolve());
    Ok(())
}

/// Persist a theme choice.
///
/// # Errors
///
/// Returns an error if the theme name is unknown or no storage location
/// could be determined.
pub fn set(theme: &str) -> Result<(), ThemeCommandError> {
    let theme: Theme = theme
        .parse()
        .map_err(|_| ThemeCommandError::InvalidTheme(theme.to_owned()))?;

    open_switcher()?.set(theme);

    info!("Theme set to {theme}");
    Ok(())
}

/// Flip the persisted theme and report the new one.
///
/// # Errors
///
/// Returns an error if no storage location could be determined.
pub fn toggle() -> Result<(), ThemeCommandError> {
    let next = open_switcher()?.toggle();

    info!("Theme is now {next}");
    Ok(())
}
