//! gRPC server plumbing.
//!
//! [`ProviderService`] is the trait the BitLaunch provider implements; the
//! private `ProviderGrpcService` adapts it to the generated tonic service,
//! moving JSON documents in and out of the protocol's `bytes` fields.
//!
//! # Signal Handling
//!
//! SIGTERM and SIGINT (CTRL+C on Windows) start a graceful shutdown: the
//! server stops accepting connections, waits up to
//! [`ServeOptions::shutdown_timeout`] for in-flight requests, then calls
//! [`ProviderService::stop`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as pb;
use crate::plan::PlanResult;
use crate::schema::{Block, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{handshake_line, ImportedResource, ProviderMetadata};

/// Operations a provider answers.
///
/// Resource state travels as JSON. A `read` that returns [`Value::Null`]
/// tells the host the resource no longer exists.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.into_keys().collect();
        let mut data_sources: Vec<String> = schema.data_sources.into_keys().collect();
        resources.sort();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
            capabilities: Default::default(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh a resource. [`Value::Null`] means it is gone.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

// =============================================================================
// Protocol conversions
// =============================================================================

impl From<Diagnostic> for pb::Diagnostic {
    fn from(d: Diagnostic) -> Self {
        let severity = match d.severity {
            DiagnosticSeverity::Error => pb::diagnostic::Severity::Error,
            DiagnosticSeverity::Warning => pb::diagnostic::Severity::Warning,
        };
        Self {
            severity: severity as i32,
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        }
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<pb::Diagnostic> {
    diagnostics.into_iter().map(Into::into).collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<pb::Diagnostic> {
    vec![Diagnostic::error(err.to_string()).into()]
}

fn schema_to_proto(schema: &Schema) -> pb::Schema {
    pb::Schema {
        version: schema.version as i64,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> pb::Block {
    let mut names: Vec<&String> = block.attributes.keys().collect();
    names.sort();

    pb::Block {
        attributes: names
            .into_iter()
            .map(|name| {
                let attr = &block.attributes[name];
                pb::Attribute {
                    name: name.clone(),
                    r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                    required: attr.flags.required,
                    optional: attr.flags.optional,
                    computed: attr.flags.computed,
                    sensitive: attr.flags.sensitive,
                    description: attr.description.clone().unwrap_or_default(),
                    force_new: attr.force_new,
                    default_value: vec![],
                }
            })
            .collect(),
        block_types: vec![],
        description: block.description.clone().unwrap_or_default(),
    }
}

/// Decode a JSON document from a request. Empty bytes are null.
fn decode(bytes: &[u8]) -> Result<Value, Status> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ProviderError::Serialization(e).into())
}

/// Encode a JSON document for a response. Null is sent as empty bytes.
fn encode(value: &Value) -> Vec<u8> {
    if value.is_null() {
        Vec::new()
    } else {
        value.to_string().into_bytes()
    }
}

fn log_diagnostics(operation: &str, subject: &str, diagnostics: &[Diagnostic]) {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        warn!(subject, errors, "{} completed with errors", operation);
    } else {
        info!(subject, "{} completed successfully", operation);
    }
}

/// Wrapper that implements the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

#[tonic::async_trait]
impl<P: ProviderService> pb::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: Request<pb::GetMetadataRequest>,
    ) -> Result<Response<pb::GetMetadataResponse>, Status> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(Response::new(pb::GetMetadataResponse {
            server_capabilities: Some(metadata.capabilities.into()),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: Request<pb::GetSchemaRequest>,
    ) -> Result<Response<pb::GetSchemaResponse>, Status> {
        let schema = self.provider.schema();
        Ok(Response::new(pb::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: Request<pb::ValidateProviderConfigRequest>,
    ) -> Result<Response<pb::ValidateProviderConfigResponse>, Status> {
        let config = decode(&request.into_inner().config)?;

        let diagnostics = match self.provider.validate_provider_config(config).await {
            Ok(diagnostics) => {
                log_diagnostics("ValidateProviderConfig", "provider", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: Request<pb::ConfigureRequest>,
    ) -> Result<Response<pb::ConfigureResponse>, Status> {
        let config = decode(&request.into_inner().config)?;

        let diagnostics = match self.provider.configure(config).await {
            Ok(diagnostics) => {
                log_diagnostics("Configure", "provider", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: Request<pb::StopRequest>,
    ) -> Result<Response<pb::StopResponse>, Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(Response::new(pb::StopResponse { error }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: Request<pb::ValidateResourceConfigRequest>,
    ) -> Result<Response<pb::ValidateResourceConfigResponse>, Status> {
        let req = request.into_inner();
        let config = decode(&req.config)?;

        let diagnostics = match self
            .provider
            .validate_resource_config(&req.resource_type, config)
            .await
        {
            Ok(diagnostics) => {
                log_diagnostics("ValidateResourceConfig", &req.resource_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "ValidateResourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: Request<pb::UpgradeResourceStateRequest>,
    ) -> Result<Response<pb::UpgradeResourceStateResponse>, Status> {
        let req = request.into_inner();
        let state = decode(&req.raw_state)?;

        let response = match self
            .provider
            .upgrade_resource_state(&req.resource_type, req.version, state)
            .await
        {
            Ok(upgraded) => pb::UpgradeResourceStateResponse {
                upgraded_state: encode(&upgraded),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, version = req.version, error = %e, "UpgradeResourceState failed");
                pb::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.plan")]
    async fn plan(
        &self,
        request: Request<pb::PlanRequest>,
    ) -> Result<Response<pb::PlanResponse>, Status> {
        let req = request.into_inner();
        let prior_state = Some(decode(&req.prior_state)?).filter(|v| !v.is_null());
        let proposed_state = decode(&req.proposed_state)?;
        let config = decode(&req.config)?;

        let response = match self
            .provider
            .plan(&req.resource_type, prior_state, proposed_state, config)
            .await
        {
            Ok(result) => {
                info!(
                    resource_type = %req.resource_type,
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                pb::PlanResponse {
                    planned_state: encode(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Plan failed");
                pb::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.create")]
    async fn create(
        &self,
        request: Request<pb::CreateRequest>,
    ) -> Result<Response<pb::CreateResponse>, Status> {
        let req = request.into_inner();
        let planned_state = decode(&req.planned_state)?;

        let response = match self.provider.create(&req.resource_type, planned_state).await {
            Ok(state) => {
                info!(resource_type = %req.resource_type, "Create completed successfully");
                pb::CreateResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Create failed");
                pb::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.read")]
    async fn read(
        &self,
        request: Request<pb::ReadRequest>,
    ) -> Result<Response<pb::ReadResponse>, Status> {
        let req = request.into_inner();
        let current_state = decode(&req.current_state)?;

        let response = match self.provider.read(&req.resource_type, current_state).await {
            Ok(state) => {
                if state.is_null() {
                    info!(resource_type = %req.resource_type, "Resource no longer exists");
                }
                pb::ReadResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Read failed");
                pb::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.update")]
    async fn update(
        &self,
        request: Request<pb::UpdateRequest>,
    ) -> Result<Response<pb::UpdateResponse>, Status> {
        let req = request.into_inner();
        let prior_state = decode(&req.prior_state)?;
        let planned_state = decode(&req.planned_state)?;

        let response = match self
            .provider
            .update(&req.resource_type, prior_state, planned_state)
            .await
        {
            Ok(state) => pb::UpdateResponse {
                state: encode(&state),
                diagnostics: vec![],
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Update failed");
                pb::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.delete")]
    async fn delete(
        &self,
        request: Request<pb::DeleteRequest>,
    ) -> Result<Response<pb::DeleteResponse>, Status> {
        let req = request.into_inner();
        let current_state = decode(&req.current_state)?;

        let diagnostics = match self.provider.delete(&req.resource_type, current_state).await {
            Ok(()) => {
                info!(resource_type = %req.resource_type, "Delete completed successfully");
                vec![]
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Delete failed");
                error_to_diagnostics(e)
            },
        };
        Ok(Response::new(pb::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: Request<pb::ImportResourceStateRequest>,
    ) -> Result<Response<pb::ImportResourceStateResponse>, Status> {
        let req = request.into_inner();

        let response = match self
            .provider
            .import_resource(&req.resource_type, &req.id)
            .await
        {
            Ok(imported) => {
                info!(
                    resource_type = %req.resource_type,
                    id = %req.id,
                    imported_count = imported.len(),
                    "ImportResourceState completed"
                );
                pb::ImportResourceStateResponse {
                    imported: imported.into_iter().map(Into::into).collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, id = %req.id, error = %e, "ImportResourceState failed");
                pb::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        request: Request<pb::ValidateDataSourceConfigRequest>,
    ) -> Result<Response<pb::ValidateDataSourceConfigResponse>, Status> {
        let req = request.into_inner();
        let config = decode(&req.config)?;

        let diagnostics = match self
            .provider
            .validate_data_source_config(&req.data_source_type, config)
            .await
        {
            Ok(diagnostics) => {
                log_diagnostics("ValidateDataSourceConfig", &req.data_source_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(data_source_type = %req.data_source_type, error = %e, "ValidateDataSourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(Response::new(pb::ValidateDataSourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.read_data_source")]
    async fn read_data_source(
        &self,
        request: Request<pb::ReadDataSourceRequest>,
    ) -> Result<Response<pb::ReadDataSourceResponse>, Status> {
        let req = request.into_inner();
        let config = decode(&req.config)?;

        let response = match self
            .provider
            .read_data_source(&req.data_source_type, config)
            .await
        {
            Ok(state) => {
                debug!(data_source_type = %req.data_source_type, "ReadDataSource completed successfully");
                pb::ReadDataSourceResponse {
                    state: encode(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(data_source_type = %req.data_source_type, error = %e, "ReadDataSource failed");
                pb::ReadDataSourceResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(Response::new(response))
    }
}

// =============================================================================
// Serving
// =============================================================================

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may run after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for SIGTERM or SIGINT (CTRL+C on Windows).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                    _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
                }
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install signal handlers");
                std::future::pending::<()>().await;
            },
        }
    }

    #[cfg(windows)]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received CTRL+C, initiating graceful shutdown"),
            Err(e) => {
                warn!(error = %e, "Failed to install CTRL+C handler");
                std::future::pending::<()>().await;
            },
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }
}

/// Serve a provider on an ephemeral localhost port.
///
/// Prints `HEMMER_PROVIDER|<version>|<address>` on stdout once listening and
/// runs until SIGTERM or SIGINT.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on_listener(provider, listener, options, wait_for_shutdown_signal()).await
}

/// Serve a provider on a specific address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// Serve a provider on a specific address with custom options.
pub async fn serve_on_with_options<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    serve_on_listener(provider, listener, options, wait_for_shutdown_signal()).await
}

async fn serve_on_listener<P, F>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: ProviderService,
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    println!("{}", handshake_line(addr));
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let grpc_service = ProviderGrpcService {
        provider: Arc::clone(&provider),
    };

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server_future = Server::builder()
        .add_service(pb::provider_server::ProviderServer::new(grpc_service))
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async {
                let _ = stop_rx.await;
            },
        );
    tokio::pin!(server_future);

    let outcome = tokio::select! {
        result = &mut server_future => result,
        _ = shutdown => {
            let _ = stop_tx.send(());
            match tokio::time::timeout(options.shutdown_timeout, &mut server_future).await {
                Ok(Ok(())) => {
                    info!("Server shutdown complete");
                    Ok(())
                },
                Ok(Err(e)) => {
                    error!(error = %e, "Server error during shutdown");
                    Err(e)
                },
                Err(_) => {
                    warn!(
                        timeout = ?options.shutdown_timeout,
                        "Shutdown timeout exceeded, forcing shutdown"
                    );
                    Ok(())
                },
            }
        },
    };

    stop_provider(&*provider, outcome).await
}

/// Call [`ProviderService::stop`], then hand back how serving ended.
async fn stop_provider<P, E>(
    provider: &P,
    outcome: Result<(), E>,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: ProviderService,
    E: std::error::Error + 'static,
{
    debug!("Calling provider stop()");
    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    outcome.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generated::provider_server::Provider;
    use crate::plan::plan_resource;
    use crate::schema::Attribute;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct EchoProvider {
        stopped: AtomicBool,
    }

    impl EchoProvider {
        fn widget() -> Schema {
            Schema::v0()
                .with_attribute("id", Attribute::computed_string())
                .with_attribute("name", Attribute::required_string().with_force_new())
        }
    }

    #[async_trait::async_trait]
    impl ProviderService for EchoProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_resource("widget", Self::widget())
                .with_data_source("lookup", Schema::v0())
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            if config.get("token").is_none() {
                return Ok(vec![Diagnostic::error("missing token").with_attribute("token")]);
            }
            Ok(vec![])
        }

        async fn stop(&self) -> Result<(), ProviderError> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(plan_resource(&Self::widget(), prior_state.as_ref(), &proposed_state))
        }

        async fn create(&self, _resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
            let mut state = planned;
            state["id"] = json!("w-1");
            Ok(state)
        }

        async fn read(&self, _resource_type: &str, current: Value) -> Result<Value, ProviderError> {
            if current["id"] == "gone" {
                return Ok(Value::Null);
            }
            Ok(current)
        }

        async fn update(
            &self,
            resource_type: &str,
            _prior: Value,
            _planned: Value,
        ) -> Result<Value, ProviderError> {
            Err(ProviderError::FailedPrecondition(format!(
                "{} cannot be updated in place",
                resource_type
            )))
        }

        async fn delete(&self, _resource_type: &str, _current: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn service() -> ProviderGrpcService<EchoProvider> {
        ProviderGrpcService {
            provider: Arc::new(EchoProvider::default()),
        }
    }

    #[test]
    fn test_decode_encode() {
        assert_eq!(decode(b"").unwrap(), Value::Null);
        assert_eq!(decode(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            decode(b"{not json").unwrap_err().code(),
            tonic::Code::InvalidArgument
        );

        assert!(encode(&Value::Null).is_empty());
        assert_eq!(encode(&json!({"a": 1})), br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn test_block_to_proto_sorts_attributes() {
        let block = block_to_proto(&EchoProvider::widget().block);
        let names: Vec<_> = block.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(block.attributes[1].force_new);
        assert!(block.block_types.is_empty());
    }

    #[test]
    fn test_diagnostic_conversion() {
        let proto: pb::Diagnostic = Diagnostic::warning("careful").with_attribute("name").into();
        assert_eq!(proto.severity, pb::diagnostic::Severity::Warning as i32);
        assert_eq!(proto.attribute, "name");
        assert!(proto.detail.is_empty());
    }

    #[test]
    fn test_default_metadata_is_sorted() {
        let metadata = EchoProvider::default().metadata();
        assert_eq!(metadata.resources, vec!["widget"]);
        assert_eq!(metadata.data_sources, vec!["lookup"]);
    }

    #[tokio::test]
    async fn test_configure_diagnostics_reach_the_wire() {
        let response = service()
            .configure(Request::new(pb::ConfigureRequest {
                config: b"{}".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].attribute, "token");
    }

    #[tokio::test]
    async fn test_create_and_read_gone() {
        let svc = service();

        let created = svc
            .create(Request::new(pb::CreateRequest {
                resource_type: "widget".to_string(),
                planned_state: br#"{"name":"a"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        let state: Value = serde_json::from_slice(&created.state).unwrap();
        assert_eq!(state["id"], "w-1");

        let read = svc
            .read(Request::new(pb::ReadRequest {
                resource_type: "widget".to_string(),
                current_state: br#"{"id":"gone"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(read.state.is_empty());
        assert!(read.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let svc = service();

        let update = svc
            .update(Request::new(pb::UpdateRequest {
                resource_type: "widget".to_string(),
                prior_state: b"{}".to_vec(),
                planned_state: b"{}".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(update.diagnostics.len(), 1);
        assert!(update.diagnostics[0].summary.contains("cannot be updated in place"));

        let import = svc
            .import_resource_state(Request::new(pb::ImportResourceStateRequest {
                resource_type: "widget".to_string(),
                id: "w-1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(import.imported.is_empty());
        assert!(import.diagnostics[0].summary.starts_with("Unimplemented"));
    }

    #[tokio::test]
    async fn test_plan_over_the_wire() {
        let response = service()
            .plan(Request::new(pb::PlanRequest {
                resource_type: "widget".to_string(),
                prior_state: br#"{"id":"w-1","name":"a"}"#.to_vec(),
                proposed_state: br#"{"name":"b"}"#.to_vec(),
                config: br#"{"name":"b"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.requires_replace);
        assert_eq!(response.changes.len(), 1);
        assert_eq!(response.changes[0].path, "name");
    }

    #[tokio::test]
    async fn test_invalid_json_is_rejected() {
        let status = service()
            .create(Request::new(pb::CreateRequest {
                resource_type: "widget".to_string(),
                planned_state: b"not json".to_vec(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_serve_stops_provider_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let provider = Arc::new(EchoProvider::default());

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let serving = serve_on_listener(
            ArcProvider(Arc::clone(&provider)),
            listener,
            ServeOptions::new().with_shutdown_timeout(Duration::from_secs(5)),
            async {
                let _ = rx.await;
            },
        );
        tx.send(()).unwrap();

        assert!(serving.await.is_ok());
        assert!(provider.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stop_runs_when_serving_failed() {
        let provider = EchoProvider::default();
        let failure = std::io::Error::other("listener closed");

        let result = stop_provider(&provider, Err(failure)).await;

        assert_eq!(result.unwrap_err().to_string(), "listener closed");
        assert!(provider.stopped.load(Ordering::SeqCst));
    }

    /// Lets the test keep a handle on the provider after `serve` takes it.
    struct ArcProvider(Arc<EchoProvider>);

    #[async_trait::async_trait]
    impl ProviderService for ArcProvider {
        fn schema(&self) -> ProviderSchema {
            self.0.schema()
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            self.0.configure(config).await
        }

        async fn stop(&self) -> Result<(), ProviderError> {
            self.0.stop().await
        }

        async fn plan(
            &self,
            resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            config: Value,
        ) -> Result<PlanResult, ProviderError> {
            self.0
                .plan(resource_type, prior_state, proposed_state, config)
                .await
        }

        async fn create(&self, resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
            self.0.create(resource_type, planned).await
        }

        async fn read(&self, resource_type: &str, current: Value) -> Result<Value, ProviderError> {
            self.0.read(resource_type, current).await
        }

        async fn update(
            &self,
            resource_type: &str,
            prior: Value,
            planned: Value,
        ) -> Result<Value, ProviderError> {
            self.0.update(resource_type, prior, planned).await
        }

        async fn delete(&self, resource_type: &str, current: Value) -> Result<(), ProviderError> {
            self.0.delete(resource_type, current).await
        }
    }
}
