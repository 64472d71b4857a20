//! `bitlaunch_image`: distributions and one-click apps.
//!
//! See <https://developers.bitlaunch.io/reference/host-image-object>.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{base_schema, fetch_create_options, require_one_of, DataSource};
use crate::api::{Client, HostImage, HostImageVersion};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

const FILTERS: [&str; 2] = ["distro_name", "version_name"];

#[derive(Debug, Deserialize)]
struct ImageConfig {
    host: String,
    #[serde(default)]
    distro_name: Option<String>,
    #[serde(default)]
    version_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageState<'a> {
    id: &'a str,
    host: &'a str,
    distro_name: &'a str,
    version_name: &'a str,
    #[serde(rename = "type")]
    image_type: &'a str,
    min_disk_size: i64,
    unavailable_regions: &'a [String],
    extra_cost_per_month: i64,
    is_windows: bool,
    password_unsupported: bool,
}

/// Find the first image matching `name` (if non-empty) and `version`.
///
/// With no `version`, or when the image's default version matches it, the
/// default version is picked; otherwise the image's versions are searched.
pub fn find_image<'a>(
    images: &'a [HostImage],
    name: &str,
    version: &str,
) -> Option<(&'a HostImage, &'a HostImageVersion)> {
    for image in images {
        if !name.is_empty() && image.name != name {
            continue;
        }
        if version.is_empty() || image.default_version.description == version {
            return Some((image, &image.default_version));
        }
        if let Some(found) = image.versions.iter().find(|v| v.description == version) {
            return Some((image, found));
        }
    }
    None
}

/// The `bitlaunch_image` data source.
#[derive(Debug, Default)]
pub struct ImageDataSource;

#[async_trait::async_trait]
impl DataSource for ImageDataSource {
    fn name(&self) -> &'static str {
        "bitlaunch_image"
    }

    fn schema(&self) -> Schema {
        base_schema("Holds details on images and apps available when configuring a server.")
            .with_attribute(
                "distro_name",
                Attribute::optional_string()
                    .with_description("The name of the Linux distribution or one-click app."),
            )
            .with_attribute(
                "version_name",
                Attribute::optional_string().with_description("The specific image version."),
            )
            .with_attribute(
                "type",
                Attribute::computed_string().with_description("The type of the image: image or app."),
            )
            .with_attribute(
                "min_disk_size",
                Attribute::computed_int64().with_description("The minimum disk size in GB."),
            )
            .with_attribute(
                "unavailable_regions",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::computed(),
                )
                .with_description("Subregion IDs the image is not offered in."),
            )
            .with_attribute(
                "extra_cost_per_month",
                Attribute::computed_int64().with_description("Extra monthly cost."),
            )
            .with_attribute(
                "is_windows",
                Attribute::computed_bool().with_description("Whether the image is Windows based."),
            )
            .with_attribute(
                "password_unsupported",
                Attribute::computed_bool()
                    .with_description("Whether setting a root password is unsupported."),
            )
            .with_at_least_one_of(&FILTERS)
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        trace!("Getting an image");
        let config: ImageConfig = serde_json::from_value(config)?;
        let name = config.distro_name.unwrap_or_default();
        let version = config.version_name.unwrap_or_default();
        if name.is_empty() && version.is_empty() {
            return Err(require_one_of(&FILTERS));
        }

        let options = fetch_create_options(client, &config.host).await?;
        let (image, found) = find_image(&options.images, &name, &version)
            .ok_or_else(|| ProviderError::NotFound("can't find matching image".to_string()))?;

        Ok(serde_json::to_value(ImageState {
            id: &found.id,
            host: &config.host,
            distro_name: &image.name,
            version_name: &found.description,
            image_type: &image.image_type,
            min_disk_size: image.min_disk_size,
            unavailable_regions: &image.unavailable_regions,
            extra_cost_per_month: image.extra_cost_per_month,
            is_windows: image.windows,
            password_unsupported: found.password_unsupported,
        })?)
    }
}
