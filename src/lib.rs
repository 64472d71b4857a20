//! Hemmer provider for the BitLaunch hosting API.
//!
//! The crate is both a library and the `hemmer-provider-bitlaunch` plugin
//! binary. Hemmer spawns the binary, reads the handshake line from stdout
//! and drives it over gRPC.
//!
//! # Overview
//!
//! - **Resources**: `bitlaunch_sshkey` and `bitlaunch_server`
//! - **Data sources**: `bitlaunch_image`, `bitlaunch_region` and `bitlaunch_size`
//! - **API client**: a small [`reqwest`] client for the BitLaunch REST API ([`api`])
//! - **Protocol**: the [`ProviderService`] trait and the gRPC server helpers ([`server`])
//! - **Testing**: [`testing::ProviderTester`] for driving a provider without gRPC
//!
//! # Running
//!
//! ```ignore
//! use hemmer_provider_bitlaunch::{init_logging, serve, BitLaunchProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     serve(BitLaunchProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! On startup [`serve`] binds an ephemeral localhost port and prints:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`
//!
//! # Configuration
//!
//! The provider block takes a `token` (or the `BITLAUNCH_API_TOKEN`
//! environment variable) and an optional `endpoint` overriding the API base
//! URL.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod data_sources;
pub mod error;
pub mod host;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

// Re-export main types at crate root
pub use error::ProviderError;
pub use host::Host;
pub use logging::{init_logging, try_init_logging};
pub use plan::{plan_resource, AttributeChange, PlanResult};
pub use provider::BitLaunchProvider;
pub use resources::WaitOptions;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    ImportedResource, ProviderMetadata, ServerCapabilities, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
