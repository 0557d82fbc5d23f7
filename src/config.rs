//! Process-wide checks and per-program configuration.

use std::sync::atomic::{AtomicBool, Ordering};

static STRICT_CHECKS: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Enable or disable strict checking process-wide.
///
/// Takes effect on the next uniform lookup of every program that has no
/// override in its [`ProgramConfig`].
/// With strict checks a direct uniform setter addressing a name the program
/// doesn't have fails with [`ProgramError::UniformNotFound`]; without them
/// the call is dropped. Defaults to on in debug builds.
///
/// [`ProgramError::UniformNotFound`]: crate::ProgramError::UniformNotFound
pub fn set_strict_checks(enabled: bool) {
    STRICT_CHECKS.store(enabled, Ordering::Relaxed);
}

/// Current process-wide strictness.
pub fn strict_checks() -> bool {
    STRICT_CHECKS.load(Ordering::Relaxed)
}

/// Configuration of one shader program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Debug label applied to the program object after every link.
    pub label: Option<String>,
    /// Whether uniform lookups on this program fail on a miss. `None`
    /// follows [`strict_checks`] at lookup time.
    pub strict_checks: Option<bool>,
}

impl ProgramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_strict_checks(mut self, enabled: bool) -> Self {
        self.strict_checks = Some(enabled);
        self
    }
}
