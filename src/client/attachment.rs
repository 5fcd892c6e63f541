//! Volume attachment operations, including device attach/detach actions.
//!
//! Attach and detach are modelled as action posts on the attachment
//! resource: the controller resolves the attachment's connection info and
//! drives the device-level operation on its side.

use std::collections::HashMap;

use reqwest::Method;
use serde::Serialize;

use crate::model::{ConnectionInfo, HostInfo, VolumeAttachment};
use crate::resource::AttachmentRequest;

use super::{ApiClient, ApiError, ATTACHMENTS_PATH};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAttachmentBody<'a> {
    volume_id: &'a str,
    host_info: &'a HostInfo,
    metadata: &'a HashMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum AttachmentAction<'a> {
    #[serde(rename = "attach")]
    Attach(&'a VolumeAttachment),
    #[serde(rename = "detach")]
    Detach(&'a VolumeAttachment),
}

impl ApiClient {
    /// Creates an attachment record for `{volume_id, host_info, metadata}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when validation, the request, or decoding fails.
    pub async fn create_attachment(
        &self,
        request: &AttachmentRequest,
    ) -> Result<VolumeAttachment, ApiError> {
        request.validate()?;
        let body = CreateAttachmentBody {
            volume_id: &request.volume_id,
            host_info: &request.host_info,
            metadata: &request.metadata,
        };
        self.execute(Method::POST, ATTACHMENTS_PATH, Some(&body))
            .await
    }

    /// Fetches an attachment by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the request.
    pub async fn get_attachment(&self, attachment_id: &str) -> Result<VolumeAttachment, ApiError> {
        let path = format!("{ATTACHMENTS_PATH}/{attachment_id}");
        self.execute(Method::GET, &path, None::<&()>).await
    }

    /// Lists all attachment records visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request or decoding fails.
    pub async fn list_attachments(&self) -> Result<Vec<VolumeAttachment>, ApiError> {
        self.execute(Method::GET, ATTACHMENTS_PATH, None::<&()>)
            .await
    }

    /// Issues the device-level attach for an attachment record.
    ///
    /// Returns the connection info produced by the controller, including the
    /// `device` entry naming the local block device.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the action.
    pub async fn attach_volume(
        &self,
        attachment: &VolumeAttachment,
    ) -> Result<ConnectionInfo, ApiError> {
        let path = format!("{ATTACHMENTS_PATH}/{}/action", attachment.id);
        self.execute(Method::POST, &path, Some(&AttachmentAction::Attach(attachment)))
            .await
    }

    /// Reverses a device-level attach.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the action.
    pub async fn detach_volume(&self, attachment: &VolumeAttachment) -> Result<(), ApiError> {
        let path = format!("{ATTACHMENTS_PATH}/{}/action", attachment.id);
        self.execute_empty(Method::POST, &path, Some(&AttachmentAction::Detach(attachment)))
            .await
    }

    /// Deletes an attachment record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the delete.
    pub async fn delete_attachment(&self, attachment_id: &str) -> Result<(), ApiError> {
        let path = format!("{ATTACHMENTS_PATH}/{attachment_id}");
        self.execute_empty(Method::DELETE, &path, None::<&()>).await
    }
}
