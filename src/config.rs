//! Configuration loading via `ortho-config`.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default controller endpoint used when nothing is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:50040";

/// Well-known path of the iSCSI initiator name configuration.
pub const DEFAULT_INITIATOR_PATH: &str = "/etc/iscsi/initiatorname.iscsi";

const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Storage controller configuration layered from defaults, configuration
/// files, and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "BLOCKCTL",
    discovery(
        app_name = "blockctl",
        env_var = "BLOCKCTL_CONFIG_PATH",
        config_file_name = "blockctl.toml",
        dotfile_name = ".blockctl.toml",
        project_file_name = "blockctl.toml"
    )
)]
pub struct ControllerConfig {
    /// Base URL of the controller's resource API.
    #[ortho_config(default = DEFAULT_ENDPOINT.to_owned())]
    pub endpoint: String,
    /// Bound applied to every remote call, in seconds. Expiry is reported as
    /// a transport error and enters the normal rollback path.
    #[ortho_config(default = 30)]
    pub api_timeout_secs: u64,
    /// Optional token sent as `X-Auth-Token` on every request.
    pub auth_token: Option<String>,
    /// Path of the initiator name file read during identity resolution.
    #[ortho_config(default = DEFAULT_INITIATOR_PATH.to_owned())]
    pub initiator_path: String,
    /// Whether to delete a freshly created volume when host identity
    /// resolution fails afterwards. The default keeps the volume because
    /// identity failures are local and retriable without touching the
    /// remote resource.
    #[ortho_config(default = false)]
    pub delete_volume_on_identity_failure: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            auth_token: None,
            initiator_path: DEFAULT_INITIATOR_PATH.to_owned(),
            delete_volume_on_identity_failure: false,
        }
    }
}

impl ControllerConfig {
    /// Loads configuration without parsing CLI arguments. Values merge
    /// defaults, configuration files, and environment variables in that
    /// order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("blockctl")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the endpoint is blank or the timeout is
    /// zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField(String::from(
                "missing controller endpoint: set BLOCKCTL_ENDPOINT or add endpoint to blockctl.toml",
            )));
        }
        if self.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when configuration parsing fails.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when a required value is missing.
    #[error("{0}")]
    MissingField(String),
    /// Raised when the API timeout is zero.
    #[error("api_timeout_secs must be greater than zero")]
    InvalidTimeout,
    /// Raised when the HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_validates() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn blank_endpoint_is_rejected() {
        let config = ControllerConfig {
            endpoint: String::from("   "),
            ..ControllerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ControllerConfig {
            api_timeout_secs: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));
    }
}
