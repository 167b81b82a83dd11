//! # relay-provider
//!
//! Sub-agent invocation layer for Relay.
//!
//! ## Features
//! - `SubAgentInvoker` gateway trait (prompt in, output + exit code out)
//! - Process-backed invoker with line streaming
//! - Model pricing tiers for cost estimation

pub mod error;
pub mod pricing;
pub mod process;
pub mod r#trait;

// Core traits and types
pub use r#trait::{InvocationResult, InvokeOptions, StreamCallback, StreamEvent, SubAgentInvoker};

// Error
pub use error::ProviderError;

// Implementations
pub use pricing::{ModelPricing, PricingTable, DEFAULT_TIER};
pub use process::ProcessInvoker;
