//! Client abstraction for the storage controller's resource API.
//!
//! The provisioning workflow talks to the controller exclusively through the
//! [`ResourceClient`] trait so tests can substitute scripted doubles for the
//! HTTP implementation.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ConnectionInfo, HostInfo, Volume, VolumeAttachment};

/// Parameters required to create a new volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeRequest {
    /// Human-friendly volume name.
    pub name: String,
    /// Requested capacity in gigabytes.
    pub size_gb: u64,
    /// Optional free-form description.
    pub description: Option<String>,
}

impl VolumeRequest {
    /// Creates a new volume request, trimming string fields.
    #[must_use]
    pub fn new(name: impl Into<String>, size_gb: u64) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            size_gb,
            description: None,
        }
    }

    /// Sets the optional description.
    #[must_use]
    pub fn description(mut self, value: Option<String>) -> Self {
        self.description = value.map(|text| text.trim().to_owned());
        self
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the name is empty or the size is zero.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.is_empty() {
            return Err(RequestError::MissingField("name"));
        }
        if self.size_gb == 0 {
            return Err(RequestError::InvalidSize);
        }
        Ok(())
    }
}

/// Parameters required to create a volume attachment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachmentRequest {
    /// Identifier of the volume to publish.
    pub volume_id: String,
    /// Identity of the host the volume is published to.
    pub host_info: HostInfo,
    /// Metadata copied from the volume.
    pub metadata: std::collections::HashMap<String, String>,
}

impl AttachmentRequest {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the volume id, host name, or initiator
    /// is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.volume_id.trim().is_empty() {
            return Err(RequestError::MissingField("volume_id"));
        }
        if self.host_info.host.trim().is_empty() {
            return Err(RequestError::MissingField("host"));
        }
        if self.host_info.initiator.trim().is_empty() {
            return Err(RequestError::MissingField("initiator"));
        }
        Ok(())
    }
}

/// Parameters required to create a profile, parsed from a caller-supplied
/// JSON definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRequest {
    /// Human-friendly profile name.
    pub name: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form capability settings forwarded to the controller.
    pub extras: std::collections::HashMap<String, serde_json::Value>,
}

impl ProfileRequest {
    /// Parses a profile definition from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidDefinition`] when the JSON does not
    /// describe a profile.
    pub fn from_json(definition: &str) -> Result<Self, RequestError> {
        serde_json::from_str(definition)
            .map_err(|err| RequestError::InvalidDefinition(err.to_string()))
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the name is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.trim().is_empty() {
            return Err(RequestError::MissingField("name"));
        }
        Ok(())
    }
}

/// Errors raised when a request fails validation before leaving the client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a required field is missing or empty.
    #[error("missing or empty field: {0}")]
    MissingField(&'static str),
    /// Raised when the requested volume size is zero.
    #[error("volume size must be greater than zero")]
    InvalidSize,
    /// Raised when a JSON resource definition cannot be parsed.
    #[error("invalid resource definition: {0}")]
    InvalidDefinition(String),
}

/// Future returned by client operations.
pub type ClientFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Operations the provisioning workflow requires from the controller.
///
/// Implementations perform one remote call per method and surface every
/// controller or transport failure through their error type; the workflow
/// treats all such failures identically.
pub trait ResourceClient {
    /// Error type returned by the implementation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a volume and returns the controller's representation.
    fn create_volume<'a>(
        &'a self,
        request: &'a VolumeRequest,
    ) -> ClientFuture<'a, Volume, Self::Error>;

    /// Deletes a volume by identifier.
    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> ClientFuture<'a, (), Self::Error>;

    /// Creates an attachment record linking a volume to a host.
    fn create_attachment<'a>(
        &'a self,
        request: &'a AttachmentRequest,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error>;

    /// Fetches an attachment, including any connection info populated by the
    /// controller since creation.
    fn get_attachment<'a>(
        &'a self,
        attachment_id: &'a str,
    ) -> ClientFuture<'a, VolumeAttachment, Self::Error>;

    /// Performs the device-level attach for an attachment record and returns
    /// the resulting connection info, including the local device path.
    fn attach_volume<'a>(
        &'a self,
        attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, ConnectionInfo, Self::Error>;

    /// Reverses a device-level attach.
    fn detach_volume<'a>(
        &'a self,
        attachment: &'a VolumeAttachment,
    ) -> ClientFuture<'a, (), Self::Error>;

    /// Deletes an attachment record by identifier.
    fn delete_attachment<'a>(
        &'a self,
        attachment_id: &'a str,
    ) -> ClientFuture<'a, (), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_request_trims_and_validates() {
        let request = VolumeRequest::new("  test-sample  ", 2);
        assert_eq!(request.name, "test-sample");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn volume_request_rejects_zero_size() {
        let request = VolumeRequest::new("test-sample", 0);
        assert_eq!(request.validate(), Err(RequestError::InvalidSize));
    }

    #[test]
    fn volume_request_rejects_blank_name() {
        let request = VolumeRequest::new("   ", 2);
        assert_eq!(request.validate(), Err(RequestError::MissingField("name")));
    }

    #[test]
    fn profile_request_parses_a_json_definition() {
        let request = ProfileRequest::from_json(
            r#"{"name":"gold","description":"fast tier","extras":{"diskType":"SSD"}}"#,
        )
        .expect("parse");

        assert_eq!(request.name, "gold");
        assert_eq!(
            request.extras.get("diskType"),
            Some(&serde_json::Value::String(String::from("SSD")))
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn profile_request_rejects_malformed_json() {
        let error = ProfileRequest::from_json("not json").expect_err("parse should fail");
        assert!(matches!(error, RequestError::InvalidDefinition(_)));
    }

    #[test]
    fn profile_request_requires_a_name() {
        let request = ProfileRequest::from_json(r#"{"extras":{}}"#).expect("parse");
        assert_eq!(request.validate(), Err(RequestError::MissingField("name")));
    }

    #[test]
    fn attachment_request_requires_initiator() {
        let request = AttachmentRequest {
            volume_id: String::from("vol-1"),
            host_info: HostInfo {
                host: String::from("node-1"),
                ..HostInfo::default()
            },
            metadata: std::collections::HashMap::new(),
        };

        assert_eq!(
            request.validate(),
            Err(RequestError::MissingField("initiator"))
        );
    }
}
