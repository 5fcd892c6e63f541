//! Binary entry point for the blockctl CLI.

use std::env;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use blockctl::{
    ApiClient, ApiError, AttachmentRequest, ControllerConfig, IdentityFailurePolicy,
    IdentitySource, ProfileRequest, ProvisionError, ProvisionOrchestrator, ProvisionOutcome,
    RequestError, SystemIdentity, VolumeAttachment, VolumeRequest,
    output::{render_dict, render_table},
};

mod cli;

use cli::{AttachmentAction, Cli, ProfileAction, PublishCommand, SnapshotAction, VolumeAction};

/// Wire-format keys shown for volume resources, in display order.
const VOLUME_KEYS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "name",
    "description",
    "size",
    "status",
    "metadata",
];

/// Wire-format keys shown for attachment resources, in display order.
const ATTACHMENT_KEYS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "volumeId",
    "status",
    "hostInfo",
    "connectionInfo",
    "metadata",
];

/// Wire-format keys shown for profile resources, in display order.
const PROFILE_KEYS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "name",
    "description",
    "extras",
];

/// Wire-format keys shown for snapshot resources, in display order.
const SNAPSHOT_KEYS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "name",
    "description",
    "size",
    "status",
    "volumeId",
];

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
    #[error("publish failed: {0}")]
    Publish(#[from] ProvisionError<ApiError>),
    #[error("output error: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

/// Installs a stderr subscriber honouring `RUST_LOG`, defaulting to warnings.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = ControllerConfig::load_without_cli_args()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let client = ApiClient::new(&config).map_err(|err| CliError::Config(err.to_string()))?;

    match cli {
        Cli::Volume(command) => volume_action(&client, command.action).await,
        Cli::Attachment(command) => attachment_action(&client, &config, command.action).await,
        Cli::Snapshot(command) => snapshot_action(&client, command.action).await,
        Cli::Profile(command) => profile_action(&client, command.action).await,
        Cli::Publish(command) => publish(client, &config, command).await,
    }
}

async fn volume_action(client: &ApiClient, action: VolumeAction) -> Result<(), CliError> {
    match action {
        VolumeAction::Create {
            size_gb,
            name,
            description,
        } => {
            let request = VolumeRequest::new(name.unwrap_or_else(generated_name), size_gb)
                .description(description);
            let volume = client.create_volume(&request).await?;
            emit_dict(&volume, VOLUME_KEYS)
        }
        VolumeAction::Show { id } => {
            let volume = client.get_volume(&id).await?;
            emit_dict(&volume, VOLUME_KEYS)
        }
        VolumeAction::List => {
            let volumes = client.list_volumes().await?;
            emit_table(&volumes, VOLUME_KEYS)
        }
        VolumeAction::Update {
            id,
            name,
            description,
        } => {
            let volume = client
                .update_volume(&id, name.as_deref(), description.as_deref())
                .await?;
            emit_dict(&volume, VOLUME_KEYS)
        }
        VolumeAction::Delete { id } => {
            client.delete_volume(&id).await?;
            Ok(())
        }
    }
}

async fn attachment_action(
    client: &ApiClient,
    config: &ControllerConfig,
    action: AttachmentAction,
) -> Result<(), CliError> {
    match action {
        AttachmentAction::Create { volume_id } => {
            let attachment = create_attachment_for_host(client, config, &volume_id).await?;
            emit_dict(&attachment, ATTACHMENT_KEYS)
        }
        AttachmentAction::Show { id } => {
            let attachment = client.get_attachment(&id).await?;
            emit_dict(&attachment, ATTACHMENT_KEYS)
        }
        AttachmentAction::List => {
            let attachments = client.list_attachments().await?;
            emit_table(&attachments, ATTACHMENT_KEYS)
        }
        AttachmentAction::Delete { id } => {
            client.delete_attachment(&id).await?;
            Ok(())
        }
    }
}

async fn snapshot_action(client: &ApiClient, action: SnapshotAction) -> Result<(), CliError> {
    match action {
        SnapshotAction::Create {
            volume_id,
            name,
            description,
        } => {
            let snapshot = client
                .create_snapshot(&volume_id, name.as_deref(), description.as_deref())
                .await?;
            emit_dict(&snapshot, SNAPSHOT_KEYS)
        }
        SnapshotAction::Show { id } => {
            let snapshot = client.get_snapshot(&id).await?;
            emit_dict(&snapshot, SNAPSHOT_KEYS)
        }
        SnapshotAction::List => {
            let snapshots = client.list_snapshots().await?;
            emit_table(&snapshots, SNAPSHOT_KEYS)
        }
        SnapshotAction::Update {
            id,
            name,
            description,
        } => {
            let snapshot = client
                .update_snapshot(&id, name.as_deref(), description.as_deref())
                .await?;
            emit_dict(&snapshot, SNAPSHOT_KEYS)
        }
        SnapshotAction::Delete { id } => {
            client.delete_snapshot(&id).await?;
            Ok(())
        }
    }
}

async fn profile_action(client: &ApiClient, action: ProfileAction) -> Result<(), CliError> {
    match action {
        ProfileAction::Create { definition } => {
            let request = ProfileRequest::from_json(&definition)?;
            let profile = client.create_profile(&request).await?;
            emit_dict(&profile, PROFILE_KEYS)
        }
        ProfileAction::Show { id } => {
            let profile = client.get_profile(&id).await?;
            emit_dict(&profile, PROFILE_KEYS)
        }
        ProfileAction::List => {
            let profiles = client.list_profiles().await?;
            emit_table(&profiles, PROFILE_KEYS)
        }
        ProfileAction::Delete { id } => {
            client.delete_profile(&id).await?;
            Ok(())
        }
    }
}

async fn publish(
    client: ApiClient,
    config: &ControllerConfig,
    command: PublishCommand,
) -> Result<(), CliError> {
    if let Some(result) = fake_publish_from_env() {
        return result;
    }

    let request = VolumeRequest::new(
        command.name.unwrap_or_else(generated_name),
        command.size_gb,
    );
    let identity = SystemIdentity::new(config.initiator_path.as_str());
    let policy = if config.delete_volume_on_identity_failure {
        IdentityFailurePolicy::DeleteVolume
    } else {
        IdentityFailurePolicy::KeepVolume
    };
    let orchestrator =
        ProvisionOrchestrator::new(client, identity).with_identity_failure_policy(policy);

    let outcome = orchestrator.execute(&request).await?;
    report_outcome(&outcome)
}

/// Creates an attachment for the given volume using this host's identity,
/// mirroring the host-info assembly performed during publish.
async fn create_attachment_for_host(
    client: &ApiClient,
    config: &ControllerConfig,
    volume_id: &str,
) -> Result<VolumeAttachment, CliError> {
    let volume = client.get_volume(volume_id).await?;
    let identity = SystemIdentity::new(config.initiator_path.as_str())
        .resolve()
        .map_err(|err| CliError::Config(err.to_string()))?;
    let initiator = identity
        .primary_initiator()
        .ok_or_else(|| CliError::Config(String::from("no iSCSI initiator found on this host")))?;
    let request = AttachmentRequest {
        volume_id: volume.id.clone(),
        host_info: identity.host_info_with(initiator),
        metadata: volume.metadata,
    };

    Ok(client.create_attachment(&request).await?)
}

fn report_outcome(outcome: &ProvisionOutcome) -> Result<(), CliError> {
    emit_dict(&outcome.volume, VOLUME_KEYS)?;
    emit_dict(&outcome.attachment, ATTACHMENT_KEYS)?;
    let line = outcome.device().map_or_else(
        || String::from("volume published; controller reported no device path"),
        |device| format!("volume published at {device}"),
    );
    emit_line(&line)
}

/// Generates a unique volume name for runs that omit `--name`.
fn generated_name() -> String {
    format!("blockctl-{}", Uuid::new_v4().simple())
}

fn emit_dict(resource: &impl Serialize, keys: &[&str]) -> Result<(), CliError> {
    let value = to_wire_value(resource)?;
    emit_text(&render_dict(&value, keys))
}

fn emit_table(resources: &[impl Serialize], keys: &[&str]) -> Result<(), CliError> {
    let values: Vec<Value> = resources
        .iter()
        .map(to_wire_value)
        .collect::<Result<_, _>>()?;
    emit_text(&render_table(&values, keys))
}

fn to_wire_value(resource: &impl Serialize) -> Result<Value, CliError> {
    serde_json::to_value(resource).map_err(|err| CliError::Output(err.to_string()))
}

fn emit_text(text: &str) -> Result<(), CliError> {
    write!(io::stdout(), "{text}").map_err(|err| CliError::Output(err.to_string()))
}

fn emit_line(text: &str) -> Result<(), CliError> {
    writeln!(io::stdout(), "{text}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

/// Lets behavioural tests drive the publish path without a controller.
fn fake_publish_from_env() -> Option<Result<(), CliError>> {
    let mode = env::var("BLOCKCTL_FAKE_PUBLISH_MODE").ok()?;
    match mode.as_str() {
        "device" => {
            emit_line("volume published at /dev/sdb").ok();
            Some(Ok(()))
        }
        "no-device" => {
            emit_line("volume published; controller reported no device path").ok();
            Some(Ok(()))
        }
        "create-failed" => Some(Err(CliError::Publish(ProvisionError::CreateVolume(
            ApiError::Transport {
                message: String::from("fake"),
            },
        )))),
        _ => None,
    }
}
