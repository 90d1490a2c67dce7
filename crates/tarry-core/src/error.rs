use thiserror::Error;

/// Rejected hook configuration. Raised when the hook is built, never later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must not be negative (got {value}ms)")]
    NegativeDuration { field: &'static str, value: i64 },

    #[error("debounce with neither a leading nor a trailing edge never invokes its target")]
    NoEdge,
}
