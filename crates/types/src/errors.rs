use alloy_primitives::Address;
use thiserror::Error;

// ============================================================================
// Main Error Enum
// ============================================================================

/// Error taxonomy for key derivation, discovery and refresh cycles
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoutError {
    // ========================================================================
    // Encoding Errors
    // ========================================================================

    /// An input violates a width or range invariant of the key encoding
    #[error("Encoding error in '{field}': {reason}")]
    Encoding { field: String, reason: String },

    // ========================================================================
    // Transport Errors
    // ========================================================================

    /// A remote instance could not be reached or answered garbage
    #[error("Transport error for instance {hook}: {reason}")]
    Transport { hook: Address, reason: String },

    /// A remote instance did not answer within the per-instance budget
    #[error("Instance {hook} timed out after {timeout_ms}ms")]
    Timeout { hook: Address, timeout_ms: u64 },

    /// JSON-RPC level error returned by the node
    #[error("RPC error (code {code:?}): {message}")]
    Rpc { message: String, code: Option<i64> },

    /// Every remote instance failed in the same cycle
    #[error("Cycle aborted: all {failed_instances} remote instance(s) failed")]
    CycleAbort { failed_instances: usize },

    // ========================================================================
    // Data Errors
    // ========================================================================

    /// Returned data could not be decoded
    #[error("Decode error: {reason}")]
    Decode { reason: String },

    /// Candidates and results could not be joined back together
    #[error("Reconcile error: {reason}")]
    Reconcile { reason: String },

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    /// Invalid configuration
    #[error("Invalid configuration for '{component}': {reason}")]
    InvalidConfiguration { component: String, reason: String },
}

impl ScoutError {
    /// Create an encoding error for the named input
    pub fn encoding(field: &str, reason: &str) -> Self {
        Self::Encoding {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a transport error scoped to one remote instance
    pub fn transport(hook: Address, reason: &str) -> Self {
        Self::Transport {
            hook,
            reason: reason.to_string(),
        }
    }

    /// Create a timeout error scoped to one remote instance
    pub fn timeout(hook: Address, timeout_ms: u64) -> Self {
        Self::Timeout { hook, timeout_ms }
    }

    /// Create an RPC error
    pub fn rpc_error(message: &str, code: Option<i64>) -> Self {
        Self::Rpc {
            message: message.to_string(),
            code,
        }
    }

    /// Create a decode error
    pub fn decode(reason: &str) -> Self {
        Self::Decode {
            reason: reason.to_string(),
        }
    }

    /// Create a reconcile error
    pub fn reconcile(reason: &str) -> Self {
        Self::Reconcile {
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(component: &str, reason: &str) -> Self {
        Self::InvalidConfiguration {
            component: component.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures scoped to a single remote instance
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. } | Self::Rpc { .. })
    }

    /// True when the node executed the call and it reverted
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc { code, message } => {
                *code == Some(3) || message.to_ascii_lowercase().contains("revert")
            }
            _ => false,
        }
    }
}

/// Result type alias using the shared error type
pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
