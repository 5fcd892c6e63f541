//! Unit tests for the provisioning workflow and its rollback invariants.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use super::*;
use crate::resource::ClientFuture;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted failure: {0}")]
struct ScriptedError(&'static str);

#[derive(Debug, Default)]
struct State {
    fail_create_volume: bool,
    fail_create_attachment: bool,
    fail_get_attachment: bool,
    fail_attach: bool,
    fail_detach: bool,
    fail_delete_attachment: bool,
    fail_delete_volume: bool,
    calls: Vec<&'static str>,
}

/// Scripted controller double recording every call in order.
#[derive(Clone, Debug, Default)]
struct ScriptedClient {
    state: Arc<Mutex<State>>,
}

impl ScriptedClient {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|err| panic!("state lock poisoned: {err}"))
    }

    fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    fn count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|name| **name == call).count()
    }

    fn record(&self, call: &'static str, fail: bool) -> Result<(), ScriptedError> {
        let mut state = self.lock();
        state.calls.push(call);
        if fail {
            return Err(ScriptedError(call));
        }
        Ok(())
    }
}

fn sample_volume() -> Volume {
    Volume {
        id: String::from("vol-1"),
        name: String::from("test-sample"),
        size: 2,
        metadata: HashMap::from([(String::from("pool"), String::from("default"))]),
        ..Volume::default()
    }
}

fn sample_attachment() -> VolumeAttachment {
    VolumeAttachment {
        id: String::from("atc-1"),
        volume_id: String::from("vol-1"),
        metadata: HashMap::from([(String::from("pool"), String::from("default"))]),
        ..VolumeAttachment::default()
    }
}

fn sample_connection() -> ConnectionInfo {
    ConnectionInfo {
        driver_volume_type: String::from("iscsi"),
        data: HashMap::from([(
            String::from("device"),
            serde_json::Value::String(String::from("/dev/sdb")),
        )]),
    }
}

impl ResourceClient for ScriptedClient {
    type Error = ScriptedError;

    fn create_volume<'a>(
        &'a self,
        _request: &'a VolumeRequest,
    ) -> ClientFuture<'a, Volume, Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_create_volume;
            self.record("create_volume", fail)?;
            Ok(sample_volume())
        })
    }

    fn delete_volume<'a>(&'a self, _volume_id: &'a str) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_delete_volume;
            self.record("delete_volume", fail)
        })
    }

    fn create_attachment<'a>(
        &'a self,
        request: &'a AttachmentRequest,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_create_attachment;
            self.record("create_attachment", fail)?;
            Ok(VolumeAttachment {
                host_info: request.host_info.clone(),
                ..sample_attachment()
            })
        })
    }

    fn get_attachment<'a>(
        &'a self,
        _attachment_id: &'a str,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_get_attachment;
            self.record("get_attachment", fail)?;
            Ok(VolumeAttachment {
                connection_info: ConnectionInfo {
                    driver_volume_type: String::from("iscsi"),
                    data: HashMap::new(),
                },
                ..sample_attachment()
            })
        })
    }

    fn attach_volume<'a>(
        &'a self,
        _attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, ConnectionInfo, Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_attach;
            self.record("attach_volume", fail)?;
            Ok(sample_connection())
        })
    }

    fn detach_volume<'a>(
        &'a self,
        _attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_detach;
            self.record("detach_volume", fail)
        })
    }

    fn delete_attachment<'a>(
        &'a self,
        _attachment_id: &'a str,
    ) -> ClientFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let fail = self.lock().fail_delete_attachment;
            self.record("delete_attachment", fail)
        })
    }
}

/// Identity double returning a fixed initiator set.
#[derive(Clone, Debug)]
struct FixedIdentity {
    initiators: Vec<String>,
    fail: bool,
}

impl FixedIdentity {
    fn with_initiators(initiators: &[&str]) -> Self {
        Self {
            initiators: initiators.iter().map(|name| (*name).to_owned()).collect(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            initiators: Vec::new(),
            fail: true,
        }
    }
}

impl IdentitySource for FixedIdentity {
    fn resolve(&self) -> Result<HostIdentity, IdentityError> {
        if self.fail {
            return Err(IdentityError::EmptyHostName);
        }
        Ok(HostIdentity {
            host: String::from("node-1"),
            platform: String::from("x86_64"),
            os_type: String::from("linux"),
            ip: Ipv4Addr::new(192, 0, 2, 10),
            initiators: self.initiators.clone(),
        })
    }
}

fn request() -> VolumeRequest {
    VolumeRequest::new("test-sample", 2)
}

fn orchestrator(
    client: &ScriptedClient,
    identity: FixedIdentity,
) -> ProvisionOrchestrator<ScriptedClient, FixedIdentity> {
    ProvisionOrchestrator::new(client.clone(), identity)
}

#[tokio::test]
async fn success_links_attachment_to_volume() {
    let client = ScriptedClient::default();
    let identity = FixedIdentity::with_initiators(&["iqn.1994-05.com.example:test"]);

    let outcome = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect("workflow should succeed");

    assert_eq!(outcome.attachment.volume_id, outcome.volume.id);
    assert_eq!(
        outcome.attachment.host_info.initiator,
        "iqn.1994-05.com.example:test"
    );
    assert_eq!(outcome.device(), Some("/dev/sdb"));
    assert_eq!(client.count("delete_volume"), 0);
    assert_eq!(client.count("delete_attachment"), 0);
}

#[tokio::test]
async fn success_copies_volume_metadata_into_attachment() {
    let client = ScriptedClient::default();
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let outcome = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect("workflow should succeed");

    assert_eq!(
        outcome.attachment.metadata.get("pool").map(String::as_str),
        Some("default")
    );
}

#[tokio::test]
async fn create_volume_failure_has_nothing_to_undo() {
    let client = ScriptedClient::default();
    client.lock().fail_create_volume = true;
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::CreateVolume(_)));
    assert!(err.rollback().is_none());
    assert_eq!(client.calls(), vec!["create_volume"]);
}

#[tokio::test]
async fn attachment_failure_deletes_volume_and_never_attaches() {
    let client = ScriptedClient::default();
    client.lock().fail_create_attachment = true;
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::CreateAttachment { .. }));
    assert_eq!(client.count("delete_volume"), 1);
    assert_eq!(client.count("attach_volume"), 0);
    let report = err.rollback().expect("rollback report");
    assert!(report.is_clean());
    assert_eq!(report.attempted, vec![RollbackStep::DeleteVolume]);
}

#[tokio::test]
async fn attach_failure_rolls_back_in_order() {
    let client = ScriptedClient::default();
    client.lock().fail_attach = true;
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::Attach { .. }));
    assert_eq!(
        client.calls(),
        vec![
            "create_volume",
            "create_attachment",
            "get_attachment",
            "attach_volume",
            "detach_volume",
            "delete_attachment",
            "delete_volume",
        ]
    );
}

#[tokio::test]
async fn rollback_attempts_every_step_despite_failures() {
    let client = ScriptedClient::default();
    {
        let mut state = client.lock();
        state.fail_attach = true;
        state.fail_detach = true;
        state.fail_delete_attachment = true;
    }
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert_eq!(client.count("delete_volume"), 1);
    let report = err.rollback().expect("rollback report");
    assert_eq!(
        report.attempted,
        vec![
            RollbackStep::DetachVolume,
            RollbackStep::DeleteAttachment,
            RollbackStep::DeleteVolume,
        ]
    );
    assert_eq!(report.failures.len(), 2);
    assert!(!report.is_clean());
    assert!(err.to_string().contains("cleanup incomplete"));
}

#[tokio::test]
async fn inspect_failure_removes_attachment_before_volume() {
    let client = ScriptedClient::default();
    client.lock().fail_get_attachment = true;
    let identity = FixedIdentity::with_initiators(&["iqn.a"]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::Inspect { .. }));
    assert_eq!(
        client.calls(),
        vec![
            "create_volume",
            "create_attachment",
            "get_attachment",
            "delete_attachment",
            "delete_volume",
        ]
    );
}

#[tokio::test]
async fn empty_initiator_set_fails_before_attachment_creation() {
    let client = ScriptedClient::default();
    let identity = FixedIdentity::with_initiators(&[]);

    let err = orchestrator(&client, identity)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::NoInitiator { .. }));
    assert_eq!(client.count("create_attachment"), 0);
    // Default policy keeps the volume for a retry.
    assert_eq!(client.count("delete_volume"), 0);
}

#[tokio::test]
async fn empty_initiator_set_deletes_volume_under_strict_policy() {
    let client = ScriptedClient::default();
    let identity = FixedIdentity::with_initiators(&[]);

    let err = orchestrator(&client, identity)
        .with_identity_failure_policy(IdentityFailurePolicy::DeleteVolume)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::NoInitiator { .. }));
    assert_eq!(client.count("delete_volume"), 1);
}

#[tokio::test]
async fn identity_failure_keeps_volume_by_default() {
    let client = ScriptedClient::default();

    let err = orchestrator(&client, FixedIdentity::failing())
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::Identity { .. }));
    assert_eq!(client.count("delete_volume"), 0);
    let report = err.rollback().expect("rollback report");
    assert!(report.attempted.is_empty());
}

#[tokio::test]
async fn identity_failure_deletes_volume_under_strict_policy() {
    let client = ScriptedClient::default();

    let err = orchestrator(&client, FixedIdentity::failing())
        .with_identity_failure_policy(IdentityFailurePolicy::DeleteVolume)
        .execute(&request())
        .await
        .expect_err("workflow should fail");

    assert!(matches!(err, ProvisionError::Identity { .. }));
    assert_eq!(client.count("delete_volume"), 1);
}
