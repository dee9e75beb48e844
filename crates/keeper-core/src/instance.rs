//! Compute instance model and the dashboard summary derived from it.
//!
//! [`InstancePage`] keeps each listed instance as the raw JSON the API
//! sent, so the listing endpoint relays it unchanged.
//! [`Instance`] is the typed view Keeper reads status, resources and
//! addresses from; it normalizes int64 fields to strings on the way in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::time::format_uptime_compact;

pub const STATUS_RUNNING: &str = "RUNNING";
pub const STATUS_STOPPED: &str = "STOPPED";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_disk: Option<BootDisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_policy: Option<SchedulingPolicy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// int64 fields arrive as JSON strings; numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(
        default,
        deserialize_with = "int64_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub memory: Option<String>,
    #[serde(
        default,
        deserialize_with = "int64_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cores: Option<String>,
    #[serde(
        default,
        deserialize_with = "int64_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub core_fraction: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_v4_address: Option<PrimaryAddress>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_to_one_nat: Option<OneToOneNat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneToOneNat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_id: Option<String>,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPolicy {
    #[serde(default)]
    pub preemptible: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of `instances.list`, instances left as the API sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePage {
    #[serde(default)]
    pub instances: Vec<Value>,
    /// Serialized as `null` on the last page; the API omits it or sends "".
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl InstancePage {
    /// Token for the following page, if there is one.
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Typed view of every instance on the page.
    pub fn parse_instances(&self) -> Result<Vec<Instance>, serde_json::Error> {
        self.instances
            .iter()
            .map(Instance::deserialize)
            .collect()
    }
}

/// Long-running operation handle returned by start/stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instance {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or_default()
    }

    pub fn is_stopped(&self) -> bool {
        self.status() == STATUS_STOPPED
    }

    pub fn is_running(&self) -> bool {
        self.status() == STATUS_RUNNING
    }

    /// Display name; the API allows unnamed instances.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    fn primary_address(&self) -> Option<&PrimaryAddress> {
        self.network_interfaces
            .first()
            .and_then(|nic| nic.primary_v4_address.as_ref())
    }

    pub fn private_ip(&self) -> Option<&str> {
        self.primary_address().and_then(|a| a.address.as_deref())
    }

    pub fn public_ip(&self) -> Option<&str> {
        self.primary_address()
            .and_then(|a| a.one_to_one_nat.as_ref())
            .and_then(|nat| nat.address.as_deref())
    }

    pub fn preemptible(&self) -> bool {
        self.scheduling_policy
            .as_ref()
            .is_some_and(|p| p.preemptible)
    }

    /// `"N/A"` unless the instance is running and its creation time parses.
    pub fn uptime(&self, now: DateTime<Utc>) -> String {
        if !self.is_running() {
            return NOT_AVAILABLE.to_owned();
        }
        let Some(created_at) = self.created_at.as_deref() else {
            return NOT_AVAILABLE.to_owned();
        };
        match DateTime::parse_from_rfc3339(created_at) {
            Ok(created) => format_uptime_compact(now - created.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(id = %self.id, created_at, error = %e, "cannot compute uptime");
                NOT_AVAILABLE.to_owned()
            }
        }
    }
}

/// Flattened view of an instance for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub zone: Option<String>,
    pub platform: Option<String>,
    pub fqdn: Option<String>,
    pub created_at: Option<String>,
    pub uptime: String,
    pub preemptible: bool,
    pub resources: ResourceSummary,
    pub network: NetworkSummary,
    pub disk: DiskSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub cores: Option<String>,
    pub memory: String,
    pub core_fraction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSummary {
    pub id: Option<String>,
    pub auto_delete: bool,
}

impl InstanceSummary {
    pub fn from_instance(instance: &Instance, now: DateTime<Utc>) -> Self {
        let resources = instance.resources.as_ref();
        let disk = instance.boot_disk.as_ref();

        Self {
            id: instance.id.clone(),
            name: instance.name.clone(),
            status: instance.status.clone(),
            zone: instance.zone_id.clone(),
            platform: instance.platform_id.clone(),
            fqdn: instance.fqdn.clone(),
            created_at: instance.created_at.clone(),
            uptime: instance.uptime(now),
            preemptible: instance.preemptible(),
            resources: ResourceSummary {
                cores: resources.and_then(|r| r.cores.clone()),
                memory: format_memory(
                    resources
                        .and_then(|r| r.memory.as_deref())
                        .unwrap_or("0"),
                ),
                core_fraction: resources.and_then(|r| r.core_fraction.clone()),
            },
            network: NetworkSummary {
                private_ip: instance.private_ip().map(str::to_owned),
                public_ip: instance.public_ip().map(str::to_owned),
            },
            disk: DiskSummary {
                id: disk.and_then(|d| d.disk_id.clone()),
                auto_delete: disk.is_some_and(|d| d.auto_delete),
            },
        }
    }
}

pub fn summarize(instances: &[Instance], now: DateTime<Utc>) -> Vec<InstanceSummary> {
    let summaries: Vec<_> = instances
        .iter()
        .map(|i| InstanceSummary::from_instance(i, now))
        .collect();
    tracing::debug!(count = summaries.len(), "summarized instances");
    summaries
}

/// Human-readable memory size from a byte count.
///
/// ```
/// use keeper_core::instance::format_memory;
/// assert_eq!(format_memory("2147483648"), "2.0 GB");
/// assert_eq!(format_memory("536870912"), "512 MB");
/// assert_eq!(format_memory("lots"), "lots");
/// ```
pub fn format_memory(bytes: &str) -> String {
    let Ok(bytes) = bytes.trim().parse::<i64>() else {
        return bytes.to_owned();
    };
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{mb:.0} MB")
    }
}

fn int64_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
