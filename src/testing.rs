//! Test harness for driving a [`ProviderService`] without a gRPC server.
//!
//! ```ignore
//! use hemmer_provider_bitlaunch::testing::ProviderTester;
//! use hemmer_provider_bitlaunch::BitLaunchProvider;
//! use serde_json::json;
//!
//! let tester = ProviderTester::new(BitLaunchProvider::new());
//! tester.configure(json!({"token": "t", "endpoint": mock.uri()})).await?;
//! let key = tester
//!     .lifecycle_create("bitlaunch_sshkey", json!({"name": "laptop", "content": "ssh-ed25519 AAA"}))
//!     .await?;
//! assert_eq!(key["fingerprint"], "aa:bb");
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::plan::PlanResult;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::ImportedResource;

/// Wraps a provider and exposes its operations with test-friendly signatures.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration, failing on any error diagnostic.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider, failing on any error diagnostic.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration, failing on any error diagnostic.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a creation.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan against an existing resource.
    pub async fn plan_change(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan a destroy.
    pub async fn plan_destroy(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource. [`Value::Null`] means it is gone.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update a resource in place.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource by ID.
    pub async fn import(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration, failing on any error diagnostic.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Plan, create, then read back. Returns the refreshed state.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan a destroy, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_destroy(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }
}

/// Failure of a tester operation that reports diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation returned error diagnostics.
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The operation failed outright.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TestError {
    /// The error diagnostics, if that is how the operation failed.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TestError::Diagnostics(diags) => diags,
            TestError::Provider(_) => &[],
        }
    }
}

fn format_diagnostics(diags: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diags.len());
    for diag in diags {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan creates a resource.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        plan.changes.iter().all(|c| c.before.is_none()),
        "Expected only additions in a create plan"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan destroys the resource.
///
/// # Panics
///
/// Panics if the planned state is not null.
pub fn assert_plan_destroys(plan: &PlanResult) {
    assert!(
        plan.planned_state.is_null(),
        "Expected a destroy plan, but planned state is {}",
        plan.planned_state
    );
}

/// Assert that a plan changes the attribute at `path`.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error whose summary contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_resource;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps "keys" in memory, enough to drive the harness.
    #[derive(Default)]
    struct KeyringProvider {
        keys: Mutex<HashMap<String, Value>>,
    }

    fn key_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
    }

    #[async_trait::async_trait]
    impl ProviderService for KeyringProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource("keyring_key", key_schema())
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            if config["token"].is_string() {
                Ok(vec![])
            } else {
                Ok(vec![Diagnostic::error("Missing API token").with_attribute("token")])
            }
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(plan_resource(&key_schema(), prior_state.as_ref(), &proposed_state))
        }

        async fn create(&self, _resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
            let mut keys = self.keys.lock().unwrap();
            let id = format!("key-{}", keys.len() + 1);
            let mut state = planned;
            state["id"] = json!(id);
            keys.insert(id, state.clone());
            Ok(state)
        }

        async fn read(&self, _resource_type: &str, current: Value) -> Result<Value, ProviderError> {
            let id = current["id"].as_str().unwrap_or_default();
            Ok(self.keys.lock().unwrap().get(id).cloned().unwrap_or(Value::Null))
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior: Value,
            _planned: Value,
        ) -> Result<Value, ProviderError> {
            Err(ProviderError::FailedPrecondition("replace only".to_string()))
        }

        async fn delete(&self, _resource_type: &str, current: Value) -> Result<(), ProviderError> {
            let id = current["id"].as_str().unwrap_or_default();
            self.keys
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| ProviderError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_configure_surfaces_diagnostics() {
        let tester = ProviderTester::new(KeyringProvider::default());
        assert!(tester.configure(json!({"token": "t"})).await.is_ok());

        let err = tester.configure(json!({})).await.unwrap_err();
        assert_error_contains(err.diagnostics(), "Missing API token");
        assert!(err.to_string().contains("(at token)"));
    }

    #[tokio::test]
    async fn test_lifecycle_create_and_delete() {
        let tester = ProviderTester::new(KeyringProvider::default());
        assert_eq!(tester.resource_types(), vec!["keyring_key"]);

        let state = tester
            .lifecycle_create("keyring_key", json!({"name": "laptop"}))
            .await
            .unwrap();
        assert_eq!(state["id"], "key-1");

        tester
            .lifecycle_delete("keyring_key", state.clone())
            .await
            .unwrap();
        assert!(tester.read("keyring_key", state).await.unwrap().is_null());
    }

    #[tokio::test]
    async fn test_plan_helpers() {
        let tester = ProviderTester::new(KeyringProvider::default());

        let create = tester
            .plan_create("keyring_key", json!({"name": "laptop"}))
            .await
            .unwrap();
        assert_plan_creates(&create);

        let prior = json!({"id": "key-1", "name": "laptop"});
        let same = tester
            .plan_change("keyring_key", prior.clone(), json!({"name": "laptop"}))
            .await
            .unwrap();
        assert_plan_no_changes(&same);

        let renamed = tester
            .plan_change("keyring_key", prior.clone(), json!({"name": "desktop"}))
            .await
            .unwrap();
        assert_plan_replaces(&renamed);
        assert_plan_changes_attribute(&renamed, "name");

        let destroy = tester.plan_destroy("keyring_key", prior).await.unwrap();
        assert_plan_destroys(&destroy);
    }

    #[tokio::test]
    async fn test_import_defaults_to_unimplemented() {
        let tester = ProviderTester::new(KeyringProvider::default());
        let err = tester.import("keyring_key", "key-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[test]
    fn test_assert_no_errors_allows_warnings() {
        assert_no_errors(&[Diagnostic::warning("Just a warning")]);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Require one of cpu_count, disk_gb, memory_mb")
                .with_attribute("cpu_count"),
            Diagnostic::error("Missing required attribute").with_detail("host"),
        ]);

        let display = err.to_string();
        assert!(display.starts_with("Operation failed with 2 diagnostic(s):"));
        assert!(display.contains("(at cpu_count)"));
        assert!(display.contains(": host"));
    }
}
