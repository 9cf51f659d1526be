pub mod anthropic;
pub mod openai;
pub(crate) mod openai_compat;
pub mod openrouter;
pub mod pricing;
pub mod registry;
pub mod routing;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use registry::ModelRegistry;
pub use traits::{ConnectionStatus, GenerateRequest, ModelProvider};
pub use util::Credentials;
