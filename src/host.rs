//! Host vendors a BitLaunch server can be placed on.
//!
//! See <https://developers.bitlaunch.io/reference/view-host-create-options>.

use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// An upstream cloud vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    /// DigitalOcean.
    DigitalOcean,
    /// Vultr.
    Vultr,
    /// Linode.
    Linode,
    /// BitLaunch's own infrastructure.
    BitLaunch,
}

impl Host {
    /// Every host, in ID order.
    pub const ALL: [Host; 4] = [Host::DigitalOcean, Host::Vultr, Host::Linode, Host::BitLaunch];

    /// Numeric ID used by the API.
    pub fn id(self) -> i64 {
        match self {
            Host::DigitalOcean => 0,
            Host::Vultr => 1,
            Host::Linode => 2,
            Host::BitLaunch => 4,
        }
    }

    /// Name used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Host::DigitalOcean => "DigitalOcean",
            Host::Vultr => "Vultr",
            Host::Linode => "Linode",
            Host::BitLaunch => "BitLaunch",
        }
    }

    /// Look a host up by its numeric ID.
    pub fn from_id(id: i64) -> Option<Host> {
        Self::ALL.into_iter().find(|h| h.id() == id)
    }

    /// Configuration names of all hosts.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|h| h.name().to_string()).collect()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Host {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.name() == s)
            .ok_or_else(|| {
                ProviderError::Validation(format!(
                    "\"host\" must be one of {}",
                    Self::names().join(", ")
                ))
            })
    }
}
