//! The provisioning-and-attachment workflow.
//!
//! Sequences the four dependent controller operations — create volume,
//! resolve host identity, create attachment, attach device — and issues
//! compensating deletes when a later step fails. Each step is attempted
//! exactly once; there is no retry loop. Rollback is a "try everything"
//! pass: every remaining undo action runs even when an earlier one fails,
//! and the failures are collected for the caller to inspect rather than
//! raised past the workflow boundary.

use std::fmt::{self, Display};

use thiserror::Error;
use tracing::warn;

use crate::host::{HostIdentity, IdentityError, IdentitySource};
use crate::model::{ConnectionInfo, Volume, VolumeAttachment};
use crate::resource::{AttachmentRequest, ResourceClient, VolumeRequest};

/// Policy applied when host identity resolution fails after the volume has
/// been created.
///
/// The reference behaviour keeps the volume: identity failures are local and
/// retriable without recreating the remote resource. Strict callers can opt
/// into deleting it instead.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IdentityFailurePolicy {
    /// Keep the volume for a later retry.
    #[default]
    KeepVolume,
    /// Delete the volume so no remote resource outlives the failed run.
    DeleteVolume,
}

/// A compensating action issued during rollback.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RollbackStep {
    /// Reverse the device-level attach.
    DetachVolume,
    /// Delete the attachment record.
    DeleteAttachment,
    /// Delete the volume.
    DeleteVolume,
}

impl Display for RollbackStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::DetachVolume => "detach volume",
            Self::DeleteAttachment => "delete attachment",
            Self::DeleteVolume => "delete volume",
        })
    }
}

/// A compensating action that failed during rollback.
#[derive(Debug)]
pub struct RollbackFailure<E> {
    /// The action that failed.
    pub step: RollbackStep,
    /// The error the action returned.
    pub source: E,
}

/// Record of a rollback pass: which actions ran and which of them failed.
///
/// Rollback failures are collected here instead of being propagated so the
/// pass always attempts every remaining action.
#[derive(Debug, Default)]
pub struct RollbackReport<E> {
    /// Every compensating action attempted, in execution order.
    pub attempted: Vec<RollbackStep>,
    /// The subset of attempted actions that failed.
    pub failures: Vec<RollbackFailure<E>>,
}

impl<E: Display> RollbackReport<E> {
    fn new() -> Self {
        Self {
            attempted: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record(&mut self, step: RollbackStep, result: Result<(), E>) {
        self.attempted.push(step);
        if let Err(source) = result {
            warn!("rollback step '{step}' failed: {source}");
            self.failures.push(RollbackFailure { step, source });
        }
    }

    /// Returns true when every attempted compensating action succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(self.failures.len());
        for failure in &self.failures {
            parts.push(format!("{}: {}", failure.step, failure.source));
        }
        parts.join("; ")
    }
}

fn append_rollback_note<E: Display>(message: String, report: &RollbackReport<E>) -> String {
    if report.is_clean() {
        message
    } else {
        format!("{message} (cleanup incomplete: {})", report.summary())
    }
}

/// Errors surfaced by the provisioning workflow, identifying the failed step
/// and carrying the rollback record for every step with something to undo.
#[derive(Debug, Error)]
pub enum ProvisionError<E>
where
    E: std::error::Error + 'static,
{
    /// Step 1 failed; nothing was created, nothing to undo.
    #[error("failed to create volume: {0}")]
    CreateVolume(#[source] E),
    /// Step 2 failed: the local environment could not report host identity.
    /// The volume is kept or deleted according to the configured policy.
    #[error("host identity resolution failed: {message}")]
    Identity {
        /// Description of the failure, including any cleanup note.
        message: String,
        /// Underlying environment error.
        #[source]
        source: IdentityError,
        /// Compensating actions attempted under the configured policy.
        rollback: RollbackReport<E>,
    },
    /// The host has no configured iSCSI initiator, so no attachment can be
    /// created. Detected before step 3; follows the identity-failure policy.
    #[error("{message}")]
    NoInitiator {
        /// Description of the failure, including any cleanup note.
        message: String,
        /// Compensating actions attempted under the configured policy.
        rollback: RollbackReport<E>,
    },
    /// Step 3 failed; the volume was rolled back.
    #[error("failed to publish volume {volume_id}: {message}")]
    CreateAttachment {
        /// Identifier of the volume that could not be published.
        volume_id: String,
        /// Description of the failure, including any cleanup note.
        message: String,
        /// Controller error that aborted the step.
        #[source]
        source: E,
        /// Compensating actions attempted, in order.
        rollback: RollbackReport<E>,
    },
    /// The post-creation attachment read-back failed; attachment and volume
    /// were rolled back.
    #[error("failed to read back attachment {attachment_id}: {message}")]
    Inspect {
        /// Identifier of the attachment that could not be read.
        attachment_id: String,
        /// Description of the failure, including any cleanup note.
        message: String,
        /// Controller error that aborted the step.
        #[source]
        source: E,
        /// Compensating actions attempted, in order.
        rollback: RollbackReport<E>,
    },
    /// Step 4 failed; detach, attachment delete, and volume delete were each
    /// attempted, in that order.
    #[error("failed to attach volume {volume_id}: {message}")]
    Attach {
        /// Identifier of the volume whose attach failed.
        volume_id: String,
        /// Description of the failure, including any cleanup note.
        message: String,
        /// Controller error that aborted the step.
        #[source]
        source: E,
        /// Compensating actions attempted, in order.
        rollback: RollbackReport<E>,
    },
}

impl<E> ProvisionError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the rollback record for the failed step, when the step had
    /// anything to undo.
    #[must_use]
    pub const fn rollback(&self) -> Option<&RollbackReport<E>> {
        match self {
            Self::CreateVolume(_) => None,
            Self::Identity { rollback, .. }
            | Self::NoInitiator { rollback, .. }
            | Self::CreateAttachment { rollback, .. }
            | Self::Inspect { rollback, .. }
            | Self::Attach { rollback, .. } => Some(rollback),
        }
    }
}

/// Result of a successful provisioning run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProvisionOutcome {
    /// The created volume.
    pub volume: Volume,
    /// The attachment record linking the volume to this host.
    pub attachment: VolumeAttachment,
    /// Connection info returned by the attach step.
    pub connection: ConnectionInfo,
}

impl ProvisionOutcome {
    /// Returns the local block device path reported by the attach step.
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        self.connection.data.get("device").and_then(|value| value.as_str())
    }
}

/// Coordinates volume creation, identity resolution, attachment creation,
/// and device attach against an explicit client handle.
#[derive(Debug)]
pub struct ProvisionOrchestrator<C, I> {
    client: C,
    identity: I,
    identity_failure_policy: IdentityFailurePolicy,
}

impl<C, I> ProvisionOrchestrator<C, I>
where
    C: ResourceClient,
    I: IdentitySource,
{
    /// Creates a new orchestrator with the default identity-failure policy.
    #[must_use]
    pub fn new(client: C, identity: I) -> Self {
        Self {
            client,
            identity,
            identity_failure_policy: IdentityFailurePolicy::default(),
        }
    }

    /// Overrides the policy applied when identity resolution fails after the
    /// volume exists.
    #[must_use]
    pub const fn with_identity_failure_policy(mut self, policy: IdentityFailurePolicy) -> Self {
        self.identity_failure_policy = policy;
        self
    }

    /// Runs the workflow to completion or rolls back and reports the failed
    /// step.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] identifying the step that failed; every
    /// variant past volume creation carries the rollback record.
    pub async fn execute(
        &self,
        request: &VolumeRequest,
    ) -> Result<ProvisionOutcome, ProvisionError<C::Error>> {
        let volume = self
            .client
            .create_volume(request)
            .await
            .map_err(ProvisionError::CreateVolume)?;

        let identity = match self.identity.resolve() {
            Ok(identity) => identity,
            Err(source) => return Err(self.identity_failure(&volume, source).await),
        };

        let Some(initiator) = identity.primary_initiator() else {
            return Err(self.no_initiator(&volume, &identity).await);
        };

        let attachment_request = AttachmentRequest {
            volume_id: volume.id.clone(),
            host_info: identity.host_info_with(initiator),
            metadata: volume.metadata.clone(),
        };

        let created = match self.client.create_attachment(&attachment_request).await {
            Ok(created) => created,
            Err(source) => return Err(self.create_attachment_failure(&volume, source).await),
        };

        // Re-read the record: the controller populates connection info after
        // scheduling the attachment.
        let attachment = match self.client.get_attachment(&created.id).await {
            Ok(attachment) => attachment,
            Err(source) => return Err(self.inspect_failure(&volume, &created, source).await),
        };

        let connection = match self.client.attach_volume(&attachment).await {
            Ok(connection) => connection,
            Err(source) => return Err(self.attach_failure(&volume, &attachment, source).await),
        };

        Ok(ProvisionOutcome {
            volume,
            attachment,
            connection,
        })
    }

    async fn delete_volume_report(&self, volume_id: &str) -> RollbackReport<C::Error> {
        let mut report = RollbackReport::new();
        report.record(
            RollbackStep::DeleteVolume,
            self.client.delete_volume(volume_id).await,
        );
        report
    }

    async fn identity_stage_report(&self, volume_id: &str) -> RollbackReport<C::Error> {
        match self.identity_failure_policy {
            IdentityFailurePolicy::KeepVolume => RollbackReport::new(),
            IdentityFailurePolicy::DeleteVolume => self.delete_volume_report(volume_id).await,
        }
    }

    async fn identity_failure(
        &self,
        volume: &Volume,
        source: IdentityError,
    ) -> ProvisionError<C::Error> {
        let rollback = self.identity_stage_report(&volume.id).await;
        ProvisionError::Identity {
            message: append_rollback_note(source.to_string(), &rollback),
            source,
            rollback,
        }
    }

    async fn no_initiator(
        &self,
        volume: &Volume,
        identity: &HostIdentity,
    ) -> ProvisionError<C::Error> {
        let rollback = self.identity_stage_report(&volume.id).await;
        let message = format!(
            "host {} has no configured iSCSI initiator; cannot publish volume {}",
            identity.host, volume.id
        );
        ProvisionError::NoInitiator {
            message: append_rollback_note(message, &rollback),
            rollback,
        }
    }

    async fn create_attachment_failure(
        &self,
        volume: &Volume,
        source: C::Error,
    ) -> ProvisionError<C::Error> {
        let rollback = self.delete_volume_report(&volume.id).await;
        ProvisionError::CreateAttachment {
            volume_id: volume.id.clone(),
            message: append_rollback_note(source.to_string(), &rollback),
            source,
            rollback,
        }
    }

    async fn inspect_failure(
        &self,
        volume: &Volume,
        created: &VolumeAttachment,
        source: C::Error,
    ) -> ProvisionError<C::Error> {
        // The attachment references the volume, so it must not outlive it:
        // attachment first, volume second.
        let mut rollback = RollbackReport::new();
        rollback.record(
            RollbackStep::DeleteAttachment,
            self.client.delete_attachment(&created.id).await,
        );
        rollback.record(
            RollbackStep::DeleteVolume,
            self.client.delete_volume(&volume.id).await,
        );
        ProvisionError::Inspect {
            attachment_id: created.id.clone(),
            message: append_rollback_note(source.to_string(), &rollback),
            source,
            rollback,
        }
    }

    async fn attach_failure(
        &self,
        volume: &Volume,
        attachment: &VolumeAttachment,
        source: C::Error,
    ) -> ProvisionError<C::Error> {
        let mut rollback = RollbackReport::new();
        rollback.record(
            RollbackStep::DetachVolume,
            self.client.detach_volume(attachment).await,
        );
        rollback.record(
            RollbackStep::DeleteAttachment,
            self.client.delete_attachment(&attachment.id).await,
        );
        rollback.record(
            RollbackStep::DeleteVolume,
            self.client.delete_volume(&volume.id).await,
        );
        ProvisionError::Attach {
            volume_id: volume.id.clone(),
            message: append_rollback_note(source.to_string(), &rollback),
            source,
            rollback,
        }
    }
}

#[cfg(test)]
mod tests;
