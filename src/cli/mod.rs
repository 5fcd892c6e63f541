//! Command-line interface definitions for the `blockctl` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page; it
//! therefore depends only on clap.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `blockctl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "blockctl",
    about = "Manage volumes, attachments, and snapshots in a storage controller",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Manage volumes in the cluster.
    #[command(name = "volume", about = "Manage volumes in the cluster")]
    Volume(VolumeCommand),
    /// Manage volume attachments in the cluster.
    #[command(name = "attachment", about = "Manage volume attachments in the cluster")]
    Attachment(AttachmentCommand),
    /// Manage volume snapshots in the cluster.
    #[command(name = "snapshot", about = "Manage volume snapshots in the cluster")]
    Snapshot(SnapshotCommand),
    /// Manage storage capability profiles in the cluster.
    #[command(name = "profile", about = "Manage storage capability profiles in the cluster")]
    Profile(ProfileCommand),
    /// Create a volume and publish it to this host.
    #[command(name = "publish", about = "Create a volume and publish it to this host")]
    Publish(PublishCommand),
}

/// Arguments for the `blockctl volume` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct VolumeCommand {
    /// Volume action to perform.
    #[command(subcommand)]
    pub(crate) action: VolumeAction,
}

/// Per-volume actions.
#[derive(Debug, Subcommand)]
pub(crate) enum VolumeAction {
    /// Create a volume of the given size.
    #[command(about = "Create a volume in the cluster")]
    Create {
        /// Requested size in gigabytes.
        size_gb: u64,
        /// Name of the created volume.
        #[arg(long, short = 'n', value_name = "NAME")]
        name: Option<String>,
        /// Description of the created volume.
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },
    /// Show one volume.
    #[command(about = "Show a volume in the cluster")]
    Show {
        /// Volume identifier.
        id: String,
    },
    /// List all volumes.
    #[command(about = "List all volumes in the cluster")]
    List,
    /// Update a volume's name or description.
    #[command(about = "Update a volume in the cluster")]
    Update {
        /// Volume identifier.
        id: String,
        /// New name for the volume.
        #[arg(long, short = 'n', value_name = "NAME")]
        name: Option<String>,
        /// New description for the volume.
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },
    /// Delete a volume.
    #[command(about = "Delete a volume in the cluster")]
    Delete {
        /// Volume identifier.
        id: String,
    },
}

/// Arguments for the `blockctl attachment` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct AttachmentCommand {
    /// Attachment action to perform.
    #[command(subcommand)]
    pub(crate) action: AttachmentAction,
}

/// Per-attachment actions.
#[derive(Debug, Subcommand)]
pub(crate) enum AttachmentAction {
    /// Create an attachment publishing a volume to this host.
    #[command(about = "Create an attachment for the specified volume")]
    Create {
        /// Identifier of the volume to publish.
        volume_id: String,
    },
    /// Show one attachment.
    #[command(about = "Show an attachment in the cluster")]
    Show {
        /// Attachment identifier.
        id: String,
    },
    /// List all attachments.
    #[command(about = "List all attachments in the cluster")]
    List,
    /// Delete an attachment.
    #[command(about = "Delete an attachment in the cluster")]
    Delete {
        /// Attachment identifier.
        id: String,
    },
}

/// Arguments for the `blockctl snapshot` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct SnapshotCommand {
    /// Snapshot action to perform.
    #[command(subcommand)]
    pub(crate) action: SnapshotAction,
}

/// Per-snapshot actions.
#[derive(Debug, Subcommand)]
pub(crate) enum SnapshotAction {
    /// Create a snapshot of the given volume.
    #[command(about = "Create a snapshot of the specified volume")]
    Create {
        /// Identifier of the volume to snapshot.
        volume_id: String,
        /// Name of the created snapshot.
        #[arg(long, short = 'n', value_name = "NAME")]
        name: Option<String>,
        /// Description of the created snapshot.
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },
    /// Show one snapshot.
    #[command(about = "Show a volume snapshot in the cluster")]
    Show {
        /// Snapshot identifier.
        id: String,
    },
    /// List all snapshots.
    #[command(about = "List all volume snapshots in the cluster")]
    List,
    /// Update a snapshot's name or description.
    #[command(about = "Update a volume snapshot in the cluster")]
    Update {
        /// Snapshot identifier.
        id: String,
        /// New name for the snapshot.
        #[arg(long, short = 'n', value_name = "NAME")]
        name: Option<String>,
        /// New description for the snapshot.
        #[arg(long, short = 'd', value_name = "TEXT")]
        description: Option<String>,
    },
    /// Delete a snapshot.
    #[command(about = "Delete a volume snapshot in the cluster")]
    Delete {
        /// Snapshot identifier.
        id: String,
    },
}

/// Arguments for the `blockctl profile` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProfileCommand {
    /// Profile action to perform.
    #[command(subcommand)]
    pub(crate) action: ProfileAction,
}

/// Per-profile actions.
#[derive(Debug, Subcommand)]
pub(crate) enum ProfileAction {
    /// Create a profile from a JSON definition.
    #[command(about = "Create a profile from a JSON definition")]
    Create {
        /// Profile definition, for example `{"name":"gold","extras":{}}`.
        #[arg(value_name = "JSON")]
        definition: String,
    },
    /// Show one profile.
    #[command(about = "Show a profile in the cluster")]
    Show {
        /// Profile identifier.
        id: String,
    },
    /// List all profiles.
    #[command(about = "List all profiles in the cluster")]
    List,
    /// Delete a profile.
    #[command(about = "Delete a profile in the cluster")]
    Delete {
        /// Profile identifier.
        id: String,
    },
}

/// Arguments for the `blockctl publish` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct PublishCommand {
    /// Requested size in gigabytes.
    pub(crate) size_gb: u64,
    /// Name of the created volume; a generated name is used when omitted.
    #[arg(long, short = 'n', value_name = "NAME")]
    pub(crate) name: Option<String>,
}
