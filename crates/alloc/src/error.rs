//! Error types for strata-alloc
//!
//! Every failure is returned as a value. Nothing here logs: the caller decides
//! whether an exhausted allocator is an event worth reporting.

use thiserror::Error;

// ============================================================================
// Main Error Type
// ============================================================================

/// Allocation errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Capacity Errors ---
    /// Bump would cross the end of a fixed region. Recoverable by reset.
    #[error("Out of space: requested {requested} bytes, {available} bytes remaining")]
    OutOfSpace { requested: usize, available: usize },

    /// The backing allocator could not provide a new block.
    #[error("Backing allocator failed to provide {size} bytes with {align} byte alignment")]
    OutOfMemory { size: usize, align: usize },

    /// A single request exceeds what one block or slot can ever hold.
    #[error("Request too large: {size} bytes (max: {max})")]
    RequestTooLarge { size: usize, max: usize },

    /// Every slot of a block allocator is handed out.
    #[error("Block pool exhausted (capacity: {capacity} slots)")]
    PoolExhausted { capacity: usize },

    // --- Precondition Violations ---
    #[error("Invalid alignment: {alignment}")]
    InvalidAlignment { alignment: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl MemoryError {
    /// Whether the same request can succeed after the owner releases memory
    /// (reset, clear or free) without reconfiguring anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OutOfSpace { .. } | Self::PoolExhausted { .. })
    }

    /// Whether the error reports a caller bug rather than a runtime condition.
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAlignment { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfSpace { .. } => "MEM:BUMP:OUT_OF_SPACE",
            Self::OutOfMemory { .. } => "MEM:BACKING:OOM",
            Self::RequestTooLarge { .. } => "MEM:ALLOC:TOO_LARGE",
            Self::PoolExhausted { .. } => "MEM:POOL:EXHAUSTED",
            Self::InvalidAlignment { .. } => "MEM:ALLOC:ALIGN",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create out of space error
    pub fn out_of_space(requested: usize, available: usize) -> Self {
        Self::OutOfSpace {
            requested,
            available,
        }
    }

    /// Create out of memory error
    pub fn out_of_memory(size: usize, align: usize) -> Self {
        Self::OutOfMemory { size, align }
    }

    /// Create request too large error
    pub fn request_too_large(size: usize, max: usize) -> Self {
        Self::RequestTooLarge { size, max }
    }

    /// Create pool exhausted error
    pub fn pool_exhausted(capacity: usize) -> Self {
        Self::PoolExhausted { capacity }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for allocator operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
