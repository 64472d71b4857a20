//! BitLaunch API request and response models.
//!
//! Field names follow the API's camelCase JSON. Every response field has a
//! default so that partial payloads still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Servers
// ============================================================================

/// A virtual server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Server {
    /// Server ID.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Numeric host ID the server lives on.
    pub host: i64,
    /// Primary IPv4 address, empty until the server is up.
    pub ipv4: String,
    /// Region ID.
    pub region: String,
    /// Size ID.
    pub size: String,
    /// Human readable size.
    pub size_desc: String,
    /// Image ID.
    pub image: String,
    /// Human readable image.
    pub image_desc: String,
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
    /// Hourly rate deducted from the account balance.
    pub rate: i64,
    /// Provisioning status: "ok", "pending", "error", "stopped", ...
    pub status: String,
    /// Error detail when `status` is "error".
    pub error_text: String,
}

/// Options for creating a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerOptions {
    /// Server name.
    pub name: String,
    /// Numeric host ID.
    #[serde(rename = "hostID")]
    pub host_id: i64,
    /// Host image (version) ID.
    #[serde(rename = "hostImageID")]
    pub host_image_id: String,
    /// Size ID.
    #[serde(rename = "sizeID")]
    pub size_id: String,
    /// Region (subregion) ID.
    #[serde(rename = "regionID")]
    pub region_id: String,
    /// SSH key IDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<String>,
    /// Root password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// First boot script.
    #[serde(rename = "initscript", skip_serializing_if = "Option::is_none")]
    pub init_script: Option<String>,
}

/// Request envelope for server creation.
#[derive(Debug, Serialize)]
pub(crate) struct CreateServerRequest<'a> {
    pub server: &'a CreateServerOptions,
}

// ============================================================================
// SSH keys
// ============================================================================

/// An SSH public key stored on the account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SshKey {
    /// Key ID.
    pub id: String,
    /// Key name.
    pub name: String,
    /// Key fingerprint.
    pub fingerprint: String,
    /// Public key content.
    pub content: String,
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
}

/// Request body for SSH key creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSshKey {
    /// Key name.
    pub name: String,
    /// Public key content.
    pub content: String,
}

// ============================================================================
// Host create options
// ============================================================================

/// Everything a host offers when creating a server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    /// Numeric host ID.
    #[serde(rename = "hostID")]
    pub host_id: i64,
    /// Images and one-click apps.
    #[serde(rename = "image")]
    pub images: Vec<HostImage>,
    /// Regions.
    #[serde(rename = "region")]
    pub regions: Vec<HostRegion>,
    /// Sizes.
    #[serde(rename = "size")]
    pub sizes: Vec<HostSize>,
}

/// A distribution or one-click app.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostImage {
    /// Image ID.
    pub id: String,
    /// Distribution or app name.
    pub name: String,
    /// "image" or "app".
    #[serde(rename = "type")]
    pub image_type: String,
    /// Minimum disk size in GB.
    pub min_disk_size: i64,
    /// Subregion IDs the image is not offered in.
    pub unavailable_regions: Vec<String>,
    /// Extra monthly cost.
    pub extra_cost_per_month: i64,
    /// Whether the image is Windows based.
    pub windows: bool,
    /// Default version.
    #[serde(rename = "version")]
    pub default_version: HostImageVersion,
    /// All versions.
    pub versions: Vec<HostImageVersion>,
}

/// A single version of an image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostImageVersion {
    /// Version ID, used as `image_id` when creating servers.
    pub id: String,
    /// Version description, e.g. "22.04 LTS".
    pub description: String,
    /// Whether root passwords are unsupported.
    pub password_unsupported: bool,
}

/// A region with its subregions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostRegion {
    /// Region ID.
    pub id: String,
    /// Region name. The API does not always trim it.
    pub name: String,
    /// ISO country code.
    pub iso: String,
    /// Default subregion.
    #[serde(rename = "subregion")]
    pub default_subregion: HostSubregion,
    /// All subregions.
    pub subregions: Vec<HostSubregion>,
}

/// A subregion (datacenter).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSubregion {
    /// Subregion ID, used as `region_id` when creating servers.
    pub id: String,
    /// Description.
    pub description: String,
    /// Slug, e.g. "nyc1".
    pub slug: String,
    /// Size IDs not offered here.
    pub unavailable_sizes: Vec<String>,
}

/// A server size (plan).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSize {
    /// Size ID.
    pub id: String,
    /// Human readable slug.
    pub slug: String,
    /// Monthly bandwidth in GB.
    #[serde(rename = "bandwidthGB")]
    pub bandwidth_gb: i64,
    /// vCPU count.
    pub cpu_count: i64,
    /// Disk space in GB.
    #[serde(rename = "diskGB")]
    pub disk_gb: i64,
    /// Memory in MB.
    #[serde(rename = "memoryMB")]
    pub memory_mb: i64,
    /// Balance deducted per hour.
    #[serde(rename = "costPerHr")]
    pub cost_per_hour: i64,
    /// USD charged per month.
    pub cost_per_month: i64,
    /// Host specific plan type.
    pub plan_type: String,
    /// Disks included with the size.
    pub disks: Vec<HostDisk>,
}

/// A disk included with a size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostDisk {
    /// SSD or HDD.
    #[serde(rename = "type")]
    pub disk_type: String,
    /// Number of disks.
    pub count: i64,
    /// Size of each disk.
    pub size: String,
    /// Unit of `size`.
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_deserialize() {
        let server: Server = serde_json::from_value(json!({
            "id": "srv-1",
            "name": "web",
            "host": 1,
            "ipv4": "203.0.113.7",
            "region": "sub-1",
            "size": "size-1",
            "image": "img-1",
            "imageDesc": "Ubuntu 22.04",
            "created": "2023-04-01T12:30:00Z",
            "rate": 12,
            "status": "ok"
        }))
        .unwrap();

        assert_eq!(server.id, "srv-1");
        assert_eq!(server.host, 1);
        assert_eq!(server.image_desc, "Ubuntu 22.04");
        assert_eq!(server.rate, 12);
        assert!(server.created.is_some());
        assert!(server.error_text.is_empty());
    }

    #[test]
    fn test_create_server_options_skip_empty() {
        let opts = CreateServerOptions {
            name: "web".to_string(),
            host_id: 4,
            host_image_id: "img".to_string(),
            size_id: "size".to_string(),
            region_id: "region".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(CreateServerRequest { server: &opts }).unwrap();

        assert_eq!(body["server"]["hostID"], 4);
        assert_eq!(body["server"]["hostImageID"], "img");
        assert!(body["server"].get("sshKeys").is_none());
        assert!(body["server"].get("password").is_none());
        assert!(body["server"].get("initscript").is_none());
    }

    #[test]
    fn test_create_options_deserialize() {
        let opts: CreateOptions = serde_json::from_value(json!({
            "hostID": 0,
            "image": [{
                "id": "ubuntu",
                "name": "Ubuntu",
                "type": "image",
                "minDiskSize": 25,
                "version": {"id": "v2204", "description": "22.04 LTS"},
                "versions": [{"id": "v2004", "description": "20.04 LTS", "passwordUnsupported": true}]
            }],
            "region": [{
                "name": " New York ",
                "iso": "US",
                "subregion": {"id": "nyc1", "slug": "nyc1"}
            }],
            "size": [{
                "id": "s-1",
                "cpuCount": 1,
                "diskGB": 25,
                "memoryMB": 1024,
                "costPerHr": 7,
                "disks": [{"type": "SSD", "count": 1, "size": "25", "unit": "GB"}]
            }]
        }))
        .unwrap();

        assert_eq!(opts.images[0].image_type, "image");
        assert_eq!(opts.images[0].default_version.id, "v2204");
        assert!(opts.images[0].versions[0].password_unsupported);
        assert_eq!(opts.regions[0].default_subregion.slug, "nyc1");
        assert_eq!(opts.sizes[0].cost_per_hour, 7);
        assert_eq!(opts.sizes[0].disks[0].disk_type, "SSD");
    }
}
