//! Core library for the blockctl storage control-plane client.
//!
//! The crate exposes a typed HTTP client for a storage controller's
//! volume, attachment, and snapshot resources, plus an orchestrator that
//! publishes a volume to the local host (create → resolve identity →
//! attach) and rolls resources back in reverse order when a step fails.

pub mod client;
pub mod config;
pub mod host;
pub mod model;
pub mod output;
pub mod provision;
pub mod resource;

pub use client::{ApiClient, ApiError};
pub use config::{ConfigError, ControllerConfig};
pub use host::{HostIdentity, IdentityError, IdentitySource, SystemIdentity};
pub use model::{ConnectionInfo, HostInfo, Profile, Volume, VolumeAttachment, VolumeSnapshot};
pub use provision::{
    IdentityFailurePolicy, ProvisionError, ProvisionOrchestrator, ProvisionOutcome,
    RollbackFailure, RollbackReport, RollbackStep,
};
pub use resource::{
    AttachmentRequest, ClientFuture, ProfileRequest, RequestError, ResourceClient, VolumeRequest,
};
