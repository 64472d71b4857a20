//! Protocol-level types shared by the server and the provider.
//!
//! These types provide a more ergonomic API over the raw protobuf types.

use serde::{Deserialize, Serialize};

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

impl From<ImportedResource> for crate::generated::ImportedResource {
    fn from(resource: ImportedResource) -> Self {
        Self {
            resource_type: resource.resource_type,
            state: resource.state.to_string().into_bytes(),
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names, sorted.
    pub resources: Vec<String>,
    /// Data source type names, sorted.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
}

impl From<ServerCapabilities> for crate::generated::ServerCapabilities {
    fn from(caps: ServerCapabilities) -> Self {
        Self {
            plan_destroy: caps.plan_destroy,
        }
    }
}

/// The protocol version for the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix output by providers.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";

/// Format the handshake line printed on stdout once the server is listening.
pub fn handshake_line(addr: std::net::SocketAddr) -> String {
    format!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("bitlaunch_sshkey", json!({"id": "k1"}));
        assert_eq!(imported.resource_type, "bitlaunch_sshkey");

        let proto: crate::generated::ImportedResource = imported.into();
        assert_eq!(proto.resource_type, "bitlaunch_sshkey");
        let state: serde_json::Value = serde_json::from_slice(&proto.state).unwrap();
        assert_eq!(state["id"], "k1");
    }

    #[test]
    fn test_capabilities_conversion() {
        let caps = ServerCapabilities { plan_destroy: true };
        let proto: crate::generated::ServerCapabilities = caps.into();
        assert!(proto.plan_destroy);
    }

    #[test]
    fn test_handshake_line() {
        let addr: std::net::SocketAddr = "127.0.0.1:50051".parse().unwrap();
        assert_eq!(handshake_line(addr), "HEMMER_PROVIDER|1|127.0.0.1:50051");
    }
}
