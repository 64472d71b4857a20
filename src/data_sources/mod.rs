//! Read-only lookups over a host's create options.
//!
//! Every data source takes a `host`, fetches what that host offers and picks
//! the first entry matching the given filters.

mod image;
mod region;
mod size;

pub use image::{find_image, ImageDataSource};
pub use region::{find_region, RegionDataSource};
pub use size::{find_size, SizeDataSource};

use serde_json::Value;
use tracing::trace;

use crate::api::{Client, CreateOptions};
use crate::error::ProviderError;
use crate::host::Host;
use crate::schema::{Attribute, Schema};

/// A data source served by the provider.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Registered type name, e.g. `bitlaunch_image`.
    fn name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> Schema;

    /// Look the data up and return its state.
    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError>;
}

/// The `host` attribute shared by every data source.
fn host_attribute() -> Attribute {
    Attribute::required_string()
        .with_description("Host Provider (DigitalOcean, Vultr, etc.)")
        .with_one_of(Host::names())
}

/// Schema skeleton shared by every data source.
fn base_schema(description: &str) -> Schema {
    Schema::v0()
        .with_description(description)
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("host", host_attribute())
}

async fn fetch_create_options(client: &Client, host: &str) -> Result<CreateOptions, ProviderError> {
    let host: Host = host.parse()?;
    trace!(host = %host, host_id = host.id(), "Fetching create options");
    Ok(client.create_options(host.id()).await?)
}

/// The "Require one of ..." error for an empty filter set.
fn require_one_of(names: &[&str]) -> ProviderError {
    ProviderError::Validation(format!("Require one of {}", names.join(", ")))
}
