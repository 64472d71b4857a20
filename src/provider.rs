//! The BitLaunch provider.
//!
//! [`BitLaunchProvider`] owns the registry of resources and data sources and
//! the API client built by `configure`. Every protocol operation looks the
//! type name up in the registry and hands the decoded JSON to it.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use crate::api::{Client, DEFAULT_BASE_URL};
use crate::data_sources::{DataSource, ImageDataSource, RegionDataSource, SizeDataSource};
use crate::error::ProviderError;
use crate::plan::{plan_resource, PlanResult};
use crate::resources::{Resource, ServerResource, SshKeyResource, WaitOptions};
use crate::schema::{Attribute, Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::ImportedResource;
use crate::validation::validate;

/// Environment variable read when the configuration has no `token`.
pub const TOKEN_ENV_VAR: &str = "BITLAUNCH_API_TOKEN";

#[derive(Debug, Default, Deserialize)]
struct ProviderConfig {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
}

/// Pick the configured token, falling back to `env`. Empty values count as unset.
fn resolve_token(configured: Option<String>, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    configured
        .filter(|t| !t.is_empty())
        .or_else(|| env(TOKEN_ENV_VAR).filter(|t| !t.is_empty()))
}

/// Provider for the BitLaunch hosting API.
pub struct BitLaunchProvider {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    client: RwLock<Option<Client>>,
}

impl BitLaunchProvider {
    /// A provider with the default server wait options.
    pub fn new() -> Self {
        Self::with_wait_options(WaitOptions::default())
    }

    /// A provider whose `bitlaunch_server` polls with `wait`.
    pub fn with_wait_options(wait: WaitOptions) -> Self {
        let resources: Vec<Box<dyn Resource>> = vec![
            Box::new(SshKeyResource),
            Box::new(ServerResource::new(wait)),
        ];
        let data_sources: Vec<Box<dyn DataSource>> = vec![
            Box::new(ImageDataSource),
            Box::new(RegionDataSource),
            Box::new(SizeDataSource),
        ];

        Self {
            resources: resources.into_iter().map(|r| (r.name(), r)).collect(),
            data_sources: data_sources.into_iter().map(|d| (d.name(), d)).collect(),
            client: RwLock::new(None),
        }
    }

    /// Whether `configure` has succeeded.
    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    fn provider_config_schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .with_description(format!(
                        "BitLaunch API token. Defaults to the {} environment variable.",
                        TOKEN_ENV_VAR
                    ))
                    .sensitive(),
            )
            .with_attribute(
                "endpoint",
                Attribute::optional_string()
                    .with_description(format!("API base URL. Defaults to {}.", DEFAULT_BASE_URL)),
            )
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|entry| &**entry)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|entry| &**entry)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    async fn client(&self) -> Result<Client, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    async fn configure_with_env(
        &self,
        config: Value,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&Self::provider_config_schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let config: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(config)?
        };

        let Some(token) = resolve_token(config.token, env) else {
            diagnostics.push(
                Diagnostic::error("Missing API token")
                    .with_detail(format!(
                        "Set \"token\" in the provider configuration or the {} environment variable.",
                        TOKEN_ENV_VAR
                    ))
                    .with_attribute("token"),
            );
            return Ok(diagnostics);
        };

        let endpoint = config
            .endpoint
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        match Client::with_base_url(token, &endpoint) {
            Ok(client) => {
                info!(endpoint = %client.base_url(), "Configured BitLaunch client");
                *self.client.write().await = Some(client);
            },
            Err(e) => diagnostics.push(
                Diagnostic::error("Invalid endpoint")
                    .with_detail(e.to_string())
                    .with_attribute("endpoint"),
            ),
        }

        Ok(diagnostics)
    }
}

impl Default for BitLaunchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BitLaunchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitLaunchProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ProviderService for BitLaunchProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(Self::provider_config_schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&Self::provider_config_schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        self.configure_with_env(config, |key| std::env::var(key).ok())
            .await
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        info!("Stopping BitLaunch provider");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(validate(&resource.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let plan = plan_resource(&resource.schema(), prior_state.as_ref(), &proposed_state);
        debug!(
            resource_type,
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "Planned resource"
        );
        Ok(plan)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        trace!(resource_type, "Creating resource");
        resource.create(&client, planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        trace!(resource_type, "Reading resource");
        match resource.read(&client, current_state).await? {
            Some(state) => Ok(state),
            None => {
                info!(resource_type, "Resource no longer exists");
                Ok(Value::Null)
            },
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        _prior_state: Value,
        _planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        Err(ProviderError::FailedPrecondition(format!(
            "{} does not support in-place updates; every attribute forces replacement",
            resource.name()
        )))
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        trace!(resource_type, "Deleting resource");
        resource.delete(&client, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        trace!(resource_type, id, "Importing resource");
        let state = resource.import(&client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        Ok(validate(&data_source.schema(), &config))
    }

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        trace!(data_source_type, "Reading data source");
        data_source.read(&client, config).await
    }
}
