//! Transport selection.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TransportFactory`] | Probes once and memoizes the chosen transport |
//! | [`FactoryBuilder`] | Fluent configuration builder |
//! | [`FactoryOptions`] | Probe timeout and per-transport options |
//! | [`TransportKind`] | Which implementation was selected |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for factory configuration.
pub mod builder;

/// Core factory implementation.
pub mod core;

/// Factory options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::FactoryBuilder;
pub use self::core::{TransportFactory, TransportKind};
pub use options::FactoryOptions;
