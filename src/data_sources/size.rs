//! `bitlaunch_size`: server plans.
//!
//! See <https://developers.bitlaunch.io/reference/host-size-object>.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{base_schema, fetch_create_options, require_one_of, DataSource};
use crate::api::{Client, HostDisk, HostSize};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

const FILTERS: [&str; 3] = ["cpu_count", "disk_gb", "memory_mb"];

#[derive(Debug, Deserialize)]
struct SizeConfig {
    host: String,
    #[serde(default)]
    cpu_count: Option<i64>,
    #[serde(default)]
    disk_gb: Option<i64>,
    #[serde(default)]
    memory_mb: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SizeState<'a> {
    id: &'a str,
    host: &'a str,
    cpu_count: i64,
    disk_gb: i64,
    memory_mb: i64,
    slug: &'a str,
    bandwidth_gb: i64,
    cost_per_hour: i64,
    cost_per_month: i64,
    plan_type: &'a str,
    disks: &'a [HostDisk],
}

/// Find the first size matching every non-zero filter.
pub fn find_size(sizes: &[HostSize], cpu_count: i64, disk_gb: i64, memory_mb: i64) -> Option<&HostSize> {
    let matches = |filter: i64, value: i64| filter == 0 || filter == value;
    sizes.iter().find(|size| {
        matches(cpu_count, size.cpu_count)
            && matches(disk_gb, size.disk_gb)
            && matches(memory_mb, size.memory_mb)
    })
}

/// The `bitlaunch_size` data source.
#[derive(Debug, Default)]
pub struct SizeDataSource;

#[async_trait::async_trait]
impl DataSource for SizeDataSource {
    fn name(&self) -> &'static str {
        "bitlaunch_size"
    }

    fn schema(&self) -> Schema {
        let disk = AttributeType::object([
            ("type", AttributeType::String),
            ("count", AttributeType::Int64),
            ("size", AttributeType::String),
            ("unit", AttributeType::String),
        ]);

        base_schema("Holds details on available size configurations for a server.")
            .with_attribute(
                "cpu_count",
                Attribute::optional_int64().with_description("The number of vCPUs included."),
            )
            .with_attribute(
                "disk_gb",
                Attribute::optional_int64().with_description("The disk space included, in GB."),
            )
            .with_attribute(
                "memory_mb",
                Attribute::optional_int64().with_description("The memory included, in MB."),
            )
            .with_attribute(
                "slug",
                Attribute::computed_string().with_description("A human readable string."),
            )
            .with_attribute(
                "bandwidth_gb",
                Attribute::computed_int64().with_description("The monthly bandwidth in GB."),
            )
            .with_attribute(
                "cost_per_hour",
                Attribute::computed_int64().with_description("The balance deducted per hour."),
            )
            .with_attribute(
                "cost_per_month",
                Attribute::computed_int64().with_description("The amount in USD charged per month."),
            )
            .with_attribute(
                "plan_type",
                Attribute::computed_string().with_description("Host specific plan type."),
            )
            .with_attribute(
                "disks",
                Attribute::new(AttributeType::list(disk), AttributeFlags::computed())
                    .with_description("Disks included with the size."),
            )
            .with_at_least_one_of(&FILTERS)
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        trace!("Getting a size");
        let config: SizeConfig = serde_json::from_value(config)?;
        let cpu_count = config.cpu_count.unwrap_or(0);
        let disk_gb = config.disk_gb.unwrap_or(0);
        let memory_mb = config.memory_mb.unwrap_or(0);
        if cpu_count == 0 && disk_gb == 0 && memory_mb == 0 {
            return Err(require_one_of(&FILTERS));
        }

        let options = fetch_create_options(client, &config.host).await?;
        let size = find_size(&options.sizes, cpu_count, disk_gb, memory_mb)
            .ok_or_else(|| ProviderError::NotFound("can't find matching size".to_string()))?;

        Ok(serde_json::to_value(SizeState {
            id: &size.id,
            host: &config.host,
            cpu_count: size.cpu_count,
            disk_gb: size.disk_gb,
            memory_mb: size.memory_mb,
            slug: &size.slug,
            bandwidth_gb: size.bandwidth_gb,
            cost_per_hour: size.cost_per_hour,
            cost_per_month: size.cost_per_month,
            plan_type: &size.plan_type,
            disks: &size.disks,
        })?)
    }
}
