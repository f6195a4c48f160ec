//! Process-wide browser environment setup
//!
//! # Init/teardown contract
//!
//! [`init_environment`] must be called once by the process entry point before
//! any crawl begins (`launch_session` also calls it). The first call resolves
//! the Chrome executable and stores the result in process-wide state; every
//! later call returns that same result regardless of its arguments. The
//! environment is never torn down: it lives until the process exits. The
//! browser processes themselves are released by `BrowserSession::close`.

use crate::config::BrowserSettings;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable that overrides Chrome discovery
pub const CHROME_PATH_ENV: &str = "CHROME_PATH";

const WELL_KNOWN_EXECUTABLES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

static ENVIRONMENT: OnceLock<BrowserEnvironment> = OnceLock::new();

/// Result of the one-time environment setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEnvironment {
    /// Resolved Chrome binary; `None` lets the driver run its own detection
    pub chrome_executable: Option<PathBuf>,
}

/// Performs the one-time setup, returning the stored environment
pub fn init_environment(settings: &BrowserSettings) -> &'static BrowserEnvironment {
    ENVIRONMENT.get_or_init(|| {
        let env_value = std::env::var(CHROME_PATH_ENV).ok();
        let chrome_executable = resolve_executable(
            settings.executable.as_deref(),
            env_value.as_deref(),
            |path| path.exists(),
        );

        match &chrome_executable {
            Some(path) => tracing::info!("Using Chrome executable {}", path.display()),
            None => tracing::debug!("No Chrome executable found, deferring to driver detection"),
        }

        BrowserEnvironment { chrome_executable }
    })
}

/// Returns the environment if [`init_environment`] has run
pub fn environment() -> Option<&'static BrowserEnvironment> {
    ENVIRONMENT.get()
}

/// Picks the Chrome binary: configured path, then the env var, then well-known paths
fn resolve_executable(
    configured: Option<&str>,
    env_value: Option<&str>,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    if let Some(path) = configured.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = env_value.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    WELL_KNOWN_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|path| exists(path))
}
