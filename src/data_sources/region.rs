//! `bitlaunch_region`: regions and their subregions (datacenters).
//!
//! See <https://developers.bitlaunch.io/reference/host-region-object>.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::{base_schema, fetch_create_options, require_one_of, DataSource};
use crate::api::{Client, HostRegion, HostSubregion};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

const FILTERS: [&str; 2] = ["region_name", "slug"];

#[derive(Debug, Deserialize)]
struct RegionConfig {
    host: String,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegionState<'a> {
    id: &'a str,
    host: &'a str,
    region_name: &'a str,
    slug: &'a str,
    iso: &'a str,
    unavailable_sizes: &'a [String],
}

/// Find the first region named `name` (if non-empty) with a subregion `slug`.
///
/// Region names are compared with surrounding whitespace removed. With no
/// `slug`, or when the default subregion matches it, the default subregion is
/// picked; otherwise the region's subregions are searched.
pub fn find_region<'a>(
    regions: &'a [HostRegion],
    name: &str,
    slug: &str,
) -> Option<(&'a HostRegion, &'a HostSubregion)> {
    let name = name.trim();
    for region in regions {
        if !name.is_empty() && region.name.trim() != name {
            continue;
        }
        if slug.is_empty() || region.default_subregion.slug == slug {
            return Some((region, &region.default_subregion));
        }
        if let Some(found) = region.subregions.iter().find(|s| s.slug == slug) {
            return Some((region, found));
        }
    }
    None
}

/// The `bitlaunch_region` data source.
#[derive(Debug, Default)]
pub struct RegionDataSource;

#[async_trait::async_trait]
impl DataSource for RegionDataSource {
    fn name(&self) -> &'static str {
        "bitlaunch_region"
    }

    fn schema(&self) -> Schema {
        base_schema("Holds available region configurations for a server.")
            .with_attribute(
                "region_name",
                Attribute::optional_string().with_description("The name of the region."),
            )
            .with_attribute(
                "slug",
                Attribute::optional_string().with_description("The specific subregion slug."),
            )
            .with_attribute(
                "iso",
                Attribute::computed_string().with_description("The ISO code for the region."),
            )
            .with_attribute(
                "unavailable_sizes",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::computed(),
                )
                .with_description("Size IDs not offered in this subregion."),
            )
            .with_at_least_one_of(&FILTERS)
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        trace!("Getting a region");
        let config: RegionConfig = serde_json::from_value(config)?;
        let name = config.region_name.unwrap_or_default();
        let slug = config.slug.unwrap_or_default();
        if name.trim().is_empty() && slug.is_empty() {
            return Err(require_one_of(&FILTERS));
        }

        let options = fetch_create_options(client, &config.host).await?;
        let (region, found) = find_region(&options.regions, &name, &slug)
            .ok_or_else(|| ProviderError::NotFound("can't find matching region".to_string()))?;

        Ok(serde_json::to_value(RegionState {
            id: &found.id,
            host: &config.host,
            region_name: region.name.trim(),
            slug: &found.slug,
            iso: &region.iso,
            unavailable_sizes: &found.unavailable_sizes,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subregion(id: &str, slug: &str) -> HostSubregion {
        HostSubregion {
            id: id.to_string(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    fn regions() -> Vec<HostRegion> {
        vec![
            HostRegion {
                name: " New York ".to_string(),
                iso: "US".to_string(),
                default_subregion: subregion("nyc1", "nyc1"),
                subregions: vec![subregion("nyc1", "nyc1"), subregion("nyc3", "nyc3")],
                ..Default::default()
            },
            HostRegion {
                name: "Amsterdam".to_string(),
                iso: "NL".to_string(),
                default_subregion: subregion("ams3", "ams3"),
                subregions: vec![subregion("ams2", "ams2")],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_name_is_trimmed_on_both_sides() {
        let regions = regions();
        let (region, found) = find_region(&regions, "New York  ", "").unwrap();
        assert_eq!(region.iso, "US");
        assert_eq!(found.id, "nyc1");
    }

    #[test]
    fn test_slug_searches_subregions() {
        let regions = regions();
        let (_, found) = find_region(&regions, "New York", "nyc3").unwrap();
        assert_eq!(found.id, "nyc3");

        let (region, found) = find_region(&regions, "", "ams2").unwrap();
        assert_eq!(region.iso, "NL");
        assert_eq!(found.id, "ams2");
    }

    #[test]
    fn test_default_subregion_matches_when_not_listed() {
        let regions = regions();
        let (region, found) = find_region(&regions, "Amsterdam", "ams3").unwrap();
        assert_eq!(region.iso, "NL");
        assert_eq!(found.id, "ams3");
    }

    #[test]
    fn test_no_match() {
        let regions = regions();
        assert!(find_region(&regions, "London", "").is_none());
        assert!(find_region(&regions, "Amsterdam", "nyc3").is_none());
    }
}
