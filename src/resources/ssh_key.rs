//! `bitlaunch_sshkey`: an SSH public key stored on the account.
//!
//! See <https://developers.bitlaunch.io/reference/ssh-key-object-1>.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{format_created, state_id, Resource};
use crate::api::{Client, CreateSshKey, SshKey};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Configurable attributes.
#[derive(Debug, Deserialize)]
struct SshKeyConfig {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct SshKeyState {
    id: String,
    name: String,
    content: String,
    fingerprint: String,
    created: String,
}

impl From<SshKey> for SshKeyState {
    fn from(key: SshKey) -> Self {
        Self {
            created: format_created(key.created),
            id: key.id,
            name: key.name,
            content: key.content,
            fingerprint: key.fingerprint,
        }
    }
}

impl SshKeyState {
    fn into_value(self) -> Result<Value, ProviderError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The `bitlaunch_sshkey` resource.
#[derive(Debug, Default)]
pub struct SshKeyResource;

impl SshKeyResource {
    async fn find(client: &Client, id: &str) -> Result<Option<SshKey>, ProviderError> {
        let keys = client.list_ssh_keys().await?;
        Ok(keys.into_iter().find(|k| k.id == id))
    }
}

#[async_trait::async_trait]
impl Resource for SshKeyResource {
    fn name(&self) -> &'static str {
        "bitlaunch_sshkey"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("SSH Key resource.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("The name of the key.")
                    .with_force_new(),
            )
            .with_attribute(
                "content",
                Attribute::required_string()
                    .with_description("The public portion of the SSH key.")
                    .with_force_new(),
            )
            .with_attribute(
                "fingerprint",
                Attribute::computed_string().with_description("The fingerprint of the key."),
            )
            .with_attribute(
                "created",
                Attribute::computed_string().with_description("The creation date of the key."),
            )
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        trace!("Creating an SSH key");
        let config: SshKeyConfig = serde_json::from_value(planned)?;

        let key = client
            .create_ssh_key(&CreateSshKey {
                name: config.name,
                content: config.content,
            })
            .await?;

        trace!(fingerprint = %key.fingerprint, "Created SSH key");
        SshKeyState::from(key).into_value()
    }

    async fn read(&self, client: &Client, current: Value) -> Result<Option<Value>, ProviderError> {
        trace!("Reading an SSH key");
        let id = state_id(&current)?;

        match Self::find(client, id).await? {
            Some(key) => SshKeyState::from(key).into_value().map(Some),
            None => {
                trace!(id, "SSH key not found");
                Ok(None)
            },
        }
    }

    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError> {
        trace!("Deleting an SSH key");
        client.delete_ssh_key(state_id(&current)?).await?;
        Ok(())
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        match Self::find(client, id).await? {
            Some(key) => SshKeyState::from(key).into_value(),
            None => Err(ProviderError::NotFound(format!("SSH key {} not found", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key_json() -> Value {
        json!({
            "id": "k1",
            "name": "laptop",
            "fingerprint": "aa:bb",
            "content": "ssh-ed25519 AAA",
            "created": "2023-04-01T12:30:00.123Z"
        })
    }

    #[test]
    fn test_schema_is_replace_only() {
        let schema = SshKeyResource.schema();
        for (name, attr) in &schema.block.attributes {
            assert!(
                !attr.is_configurable() || attr.force_new,
                "{} should force replacement",
                name
            );
        }
        assert_eq!(validate(&schema, &json!({"name": "laptop"})).len(), 1);
    }

    #[tokio::test]
    async fn test_create_copies_key_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ssh-keys"))
            .and(body_json(json!({"name": "laptop", "content": "ssh-ed25519 AAA"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(key_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::with_base_url("t", &server.uri()).unwrap();
        let state = SshKeyResource
            .create(
                &client,
                json!({"name": "laptop", "content": "ssh-ed25519 AAA", "id": null, "fingerprint": null}),
            )
            .await
            .unwrap();

        assert_eq!(state["id"], "k1");
        assert_eq!(state["fingerprint"], "aa:bb");
        assert_eq!(state["created"], "2023-04-01T12:30:00Z");
    }

    #[tokio::test]
    async fn test_read_missing_key_is_gone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh-keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([key_json()])))
            .mount(&server)
            .await;

        let client = Client::with_base_url("t", &server.uri()).unwrap();

        let found = SshKeyResource
            .read(&client, json!({"id": "k1"}))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["name"], "laptop");

        let gone = SshKeyResource
            .read(&client, json!({"id": "k2"}))
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_import_unknown_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ssh-keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = Client::with_base_url("t", &server.uri()).unwrap();
        let err = SshKeyResource.import(&client, "k9").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
