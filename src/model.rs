//! Resource representations exchanged with the storage controller.
//!
//! Field names follow the controller's camelCase wire format. Responses
//! frequently omit fields the scheduler has not populated yet, so most
//! non-identity fields default when absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A block-storage volume managed by the controller.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    /// Controller-assigned identifier.
    pub id: String,
    /// Creation timestamp as reported by the controller.
    pub created_at: String,
    /// Last-update timestamp as reported by the controller.
    pub updated_at: String,
    /// Human-friendly volume name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Requested capacity in gigabytes.
    pub size: u64,
    /// Lifecycle status (for example `available` or `inUse`).
    pub status: String,
    /// Free-form metadata attached by the controller or the caller.
    pub metadata: HashMap<String, String>,
}

/// Identity of the host requesting an attachment.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct HostInfo {
    /// Host name reported by the operating system.
    pub host: String,
    /// CPU architecture string (for example `x86_64`).
    pub platform: String,
    /// Operating system identifier (for example `linux`).
    pub os_type: String,
    /// Dotted-quad IPv4 address of the host.
    pub ip: String,
    /// iSCSI initiator name selected for this attachment.
    pub initiator: String,
}

/// Protocol-specific details needed to connect a volume to a host.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionInfo {
    /// Connection protocol (for example `iscsi`).
    pub driver_volume_type: String,
    /// Protocol-specific fields such as target portal, IQN, and LUN.
    pub data: HashMap<String, serde_json::Value>,
}

impl ConnectionInfo {
    /// Returns true when the controller has not populated any connection data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.driver_volume_type.is_empty() && self.data.is_empty()
    }
}

/// A record linking a volume to a host, authorising a device-level connection.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeAttachment {
    /// Controller-assigned identifier.
    pub id: String,
    /// Creation timestamp as reported by the controller.
    pub created_at: String,
    /// Last-update timestamp as reported by the controller.
    pub updated_at: String,
    /// Identifier of the attached volume.
    pub volume_id: String,
    /// Identity of the host the volume is published to.
    pub host_info: HostInfo,
    /// Connection details populated once the controller schedules the
    /// attachment.
    pub connection_info: ConnectionInfo,
    /// Metadata copied from the volume at attachment time.
    pub metadata: HashMap<String, String>,
    /// Lifecycle status (for example `creating` or `attached`).
    pub status: String,
}

/// A point-in-time snapshot of a volume.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeSnapshot {
    /// Controller-assigned identifier.
    pub id: String,
    /// Creation timestamp as reported by the controller.
    pub created_at: String,
    /// Last-update timestamp as reported by the controller.
    pub updated_at: String,
    /// Human-friendly snapshot name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Snapshot size in gigabytes.
    pub size: u64,
    /// Lifecycle status.
    pub status: String,
    /// Identifier of the snapshotted volume.
    pub volume_id: String,
}

/// A named set of storage capabilities volumes can be provisioned against.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Controller-assigned identifier.
    pub id: String,
    /// Creation timestamp as reported by the controller.
    pub created_at: String,
    /// Last-update timestamp as reported by the controller.
    pub updated_at: String,
    /// Human-friendly profile name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Free-form capability settings interpreted by the controller's
    /// scheduler.
    pub extras: HashMap<String, serde_json::Value>,
}
