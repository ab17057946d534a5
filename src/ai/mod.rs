//! Generation providers and the machinery around them

pub mod http;
pub mod normalize;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod transport;

// Re-export main types for convenience
pub use provider::{Capability, Provider, local_metadata};
pub use providers::build_providers;
pub use registry::ProviderRegistry;
pub use transport::{Transport, TransportPolicy};
