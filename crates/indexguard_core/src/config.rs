//! Guard configuration.

/// What a guard does with its state when a forwarded create fails inside the
/// index.
///
/// A failed close or drop always stays in `Closing` or `Dropping`, whatever
/// the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stay in `Creating`.
    ///
    /// Every later call is rejected: the index may be half-built and the
    /// guard cannot tell.
    #[default]
    RemainTransient,
    /// Return to `Uninitialized` so the caller may retry the create.
    Revert,
}

/// Configuration for a [`crate::ContractCheckingProxy`].
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Name of the guarded index, used in errors and log fields.
    pub name: String,

    /// State handling after a failed create.
    pub failure_policy: FailurePolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            name: "index".to_string(),
            failure_policy: FailurePolicy::RemainTransient,
        }
    }
}

impl GuardConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
