//! Arena configuration parameters.

/// When the block layout consistency check runs after a mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvariantChecks {
    /// Check after every mutation in builds with debug assertions;
    /// skipped in release builds.
    #[default]
    DebugOnly,
    /// Check after every mutation regardless of build profile.
    Always,
}

impl InvariantChecks {
    /// Whether checks run in the current build.
    pub fn enabled(self) -> bool {
        match self {
            Self::DebugOnly => cfg!(debug_assertions),
            Self::Always => true,
        }
    }
}

/// Configuration for an [`Arena`](crate::Arena).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing buffer in bytes, tags included.
    ///
    /// Must hold at least one minimal block
    /// (`size_of::<T>() + 2 * TAG_SIZE` bytes).
    pub capacity: usize,

    /// When to run the post-mutation consistency check.
    ///
    /// Default: [`InvariantChecks::DebugOnly`].
    pub checks: InvariantChecks,

    /// Reject `deallocate` calls whose element count could not have
    /// produced the block being released.
    ///
    /// Default: `false` (the count is advisory and the stored tag size is
    /// trusted).
    pub strict_deallocate: bool,
}

impl ArenaConfig {
    /// Default consistency check policy.
    pub const DEFAULT_CHECKS: InvariantChecks = InvariantChecks::DebugOnly;

    /// Default deallocation strictness.
    pub const DEFAULT_STRICT_DEALLOCATE: bool = false;

    /// Create a config for the given capacity with defaults for the rest.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            checks: Self::DEFAULT_CHECKS,
            strict_deallocate: Self::DEFAULT_STRICT_DEALLOCATE,
        }
    }

    /// Set the consistency check policy.
    pub fn with_checks(mut self, checks: InvariantChecks) -> Self {
        self.checks = checks;
        self
    }

    /// Enable or disable strict deallocation.
    pub fn with_strict_deallocate(mut self, strict: bool) -> Self {
        self.strict_deallocate = strict;
        self
    }
}
