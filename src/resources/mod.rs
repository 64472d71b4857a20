//! Managed resources.
//!
//! Each resource knows its schema and how to create, refresh and delete
//! itself through the API [`Client`]. Every configurable attribute forces
//! replacement, so there is no update path.

mod server;
mod ssh_key;

pub use server::{ServerResource, WaitOptions};
pub use ssh_key::SshKeyResource;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::api::Client;
use crate::error::ProviderError;
use crate::schema::Schema;

/// A resource type served by the provider.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Registered type name, e.g. `bitlaunch_server`.
    fn name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Create the resource from its planned state and return the new state.
    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh the resource. `None` means it no longer exists.
    async fn read(&self, client: &Client, current: Value) -> Result<Option<Value>, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError>;

    /// Build state for an existing resource from its ID.
    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let _ = (client, id);
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            self.name()
        )))
    }
}

/// The `id` attribute of a state document.
pub(crate) fn state_id(state: &Value) -> Result<&str, ProviderError> {
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::Validation("state has no \"id\"".to_string()))
}

/// RFC 3339 with second precision and a `Z` suffix. Unknown times are empty.
pub(crate) fn format_created(created: Option<DateTime<Utc>>) -> String {
    created
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_state_id() {
        assert_eq!(state_id(&json!({"id": "srv-1"})).unwrap(), "srv-1");
        assert!(state_id(&json!({"id": ""})).is_err());
        assert!(state_id(&json!({"id": null})).is_err());
        assert!(state_id(&Value::Null).is_err());
    }

    #[test]
    fn test_format_created() {
        let t = Utc.with_ymd_and_hms(2023, 4, 1, 12, 30, 0).unwrap();
        assert_eq!(format_created(Some(t)), "2023-04-01T12:30:00Z");
        assert_eq!(format_created(None), "");
    }
}
