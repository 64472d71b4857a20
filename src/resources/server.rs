//! `bitlaunch_server`: a virtual machine on one of the BitLaunch hosts.
//!
//! See <https://developers.bitlaunch.io/reference/create-server>.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::{format_created, state_id, Resource};
use crate::api::{Client, CreateServerOptions, Server};
use crate::error::ProviderError;
use crate::host::Host;
use crate::schema::{Attribute, AttributeType, AttributeFlags, Schema};

/// Polling interval while waiting for a server to come up.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long to wait for a server to come up.
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Controls the `wait_for_ip` polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Sleep between status checks.
    pub interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl WaitOptions {
    /// Default options: poll every second for up to a minute.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    host: String,
    name: String,
    image_id: String,
    size_id: String,
    region_id: String,
    #[serde(default)]
    ssh_keys: Option<Vec<String>>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    initscript: Option<String>,
    #[serde(default)]
    wait_for_ip: Option<bool>,
}

/// Attributes the API does not report back and that are kept from state.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Retained {
    host: Option<String>,
    ssh_keys: Option<Vec<String>>,
    password: Option<String>,
    initscript: Option<String>,
    wait_for_ip: Option<bool>,
}

impl From<ServerConfig> for Retained {
    fn from(config: ServerConfig) -> Self {
        Self {
            host: Some(config.host),
            ssh_keys: config.ssh_keys,
            password: config.password,
            initscript: config.initscript,
            wait_for_ip: config.wait_for_ip,
        }
    }
}

#[derive(Debug, Serialize)]
struct ServerState {
    id: String,
    host: String,
    name: String,
    image_id: String,
    image_description: String,
    size_id: String,
    region_id: String,
    ipv4: String,
    status: String,
    created: String,
    rate: i64,
    ssh_keys: Option<Vec<String>>,
    password: Option<String>,
    initscript: Option<String>,
    wait_for_ip: Option<bool>,
}

impl ServerState {
    fn new(server: Server, retained: Retained) -> Self {
        Self {
            created: format_created(server.created),
            id: server.id,
            host: retained.host.unwrap_or_default(),
            name: server.name,
            image_id: server.image,
            image_description: server.image_desc,
            size_id: server.size,
            region_id: server.region,
            ipv4: server.ipv4,
            status: server.status,
            rate: server.rate,
            ssh_keys: retained.ssh_keys,
            password: retained.password,
            initscript: retained.initscript,
            wait_for_ip: retained.wait_for_ip,
        }
    }

    fn into_value(self) -> Result<Value, ProviderError> {
        Ok(serde_json::to_value(self)?)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// The `bitlaunch_server` resource.
#[derive(Debug, Default)]
pub struct ServerResource {
    wait: WaitOptions,
}

impl ServerResource {
    /// A server resource that polls with the given options.
    pub fn new(wait: WaitOptions) -> Self {
        Self { wait }
    }

    /// Poll until the server reports `ok`, fails, or the timeout passes.
    async fn wait_for_ready(&self, client: &Client, id: &str) -> Result<Server, ProviderError> {
        info!(server_id = %id, timeout = ?self.wait.timeout, "Waiting for server to be ready");
        let deadline = Instant::now() + self.wait.timeout;

        loop {
            if Instant::now() > deadline {
                return Err(ProviderError::DeadlineExceeded(
                    "timed out getting IPv4 address".to_string(),
                ));
            }

            let server = client.get_server(id).await?;
            debug!(server_id = %id, status = %server.status, "Polled server status");

            match server.status.as_str() {
                "ok" => return Ok(server),
                "error" | "stopped" => {
                    warn!(
                        server_id = %id,
                        status = %server.status,
                        error = %server.error_text,
                        "Server failed to start"
                    );
                    return Err(ProviderError::FailedPrecondition(
                        "server creation returned error status".to_string(),
                    ));
                },
                _ => {},
            }

            tokio::time::sleep(self.wait.interval).await;
        }
    }
}

#[async_trait::async_trait]
impl Resource for ServerResource {
    fn name(&self) -> &'static str {
        "bitlaunch_server"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Virtual Machine Server")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "host",
                Attribute::required_string()
                    .with_description("The host for the server to reside on.")
                    .with_force_new()
                    .with_one_of(Host::names()),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("The name of the server.")
                    .with_force_new(),
            )
            .with_attribute(
                "image_id",
                Attribute::required_string()
                    .with_description("The image ID to use on the server.")
                    .with_force_new(),
            )
            .with_attribute(
                "size_id",
                Attribute::required_string()
                    .with_description("The size ID of the server to be provisioned to.")
                    .with_force_new(),
            )
            .with_attribute(
                "region_id",
                Attribute::required_string()
                    .with_description("The region ID of the location that the server will reside at.")
                    .with_force_new(),
            )
            .with_attribute(
                "ssh_keys",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::optional(),
                )
                .with_description(
                    "SSH key IDs to place on the server. Required when no password is set \
                     or the image does not support passwords.",
                )
                .with_force_new(),
            )
            .with_attribute(
                "password",
                Attribute::optional_string()
                    .with_description("The root user password. Required when no SSH keys are set.")
                    .with_force_new()
                    .sensitive(),
            )
            .with_attribute(
                "initscript",
                Attribute::optional_string()
                    .with_description("A script to run on first boot. Only some hosts support it.")
                    .with_force_new(),
            )
            .with_attribute(
                "wait_for_ip",
                Attribute::optional_bool()
                    .with_description("Wait until the server is up and has an IPv4 address.")
                    .with_force_new(),
            )
            .with_attribute(
                "ipv4",
                Attribute::computed_string().with_description("The IPv4 address of the server."),
            )
            .with_attribute(
                "status",
                Attribute::computed_string().with_description("The status of the server."),
            )
            .with_attribute(
                "created",
                Attribute::computed_string().with_description("The creation date of the server."),
            )
            .with_attribute(
                "image_description",
                Attribute::computed_string()
                    .with_description("The description of the image installed on the server."),
            )
            .with_attribute(
                "rate",
                Attribute::computed_int64().with_description(
                    "The hourly rate deducted from the account balance.",
                ),
            )
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        trace!("Creating a server");
        let config: ServerConfig = serde_json::from_value(planned)?;
        let host: Host = config.host.parse()?;

        let opts = CreateServerOptions {
            name: config.name.clone(),
            host_id: host.id(),
            host_image_id: config.image_id.clone(),
            size_id: config.size_id.clone(),
            region_id: config.region_id.clone(),
            ssh_keys: config.ssh_keys.clone().unwrap_or_default(),
            password: non_empty(&config.password),
            init_script: non_empty(&config.initscript),
        };

        let mut server = client.create_server(&opts).await?;
        info!(server_id = %server.id, host = %host, "Server created");

        if config.wait_for_ip.unwrap_or(false) {
            server = self.wait_for_ready(client, &server.id).await?;
        }

        trace!(server_id = %server.id, "Created server");
        ServerState::new(server, config.into()).into_value()
    }

    async fn read(&self, client: &Client, current: Value) -> Result<Option<Value>, ProviderError> {
        trace!("Reading a server");
        let id = state_id(&current)?.to_string();

        let servers = client.list_servers().await?;
        let Some(server) = servers.into_iter().find(|s| s.id == id) else {
            trace!(server_id = %id, "Server not found");
            return Ok(None);
        };

        let retained: Retained = serde_json::from_value(current)?;
        ServerState::new(server, retained).into_value().map(Some)
    }

    async fn delete(&self, client: &Client, current: Value) -> Result<(), ProviderError> {
        trace!("Deleting a server");
        client.destroy_server(state_id(&current)?).await?;
        Ok(())
    }
}
