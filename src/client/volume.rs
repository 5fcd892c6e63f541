//! Volume CRUD operations against the storage controller.

use reqwest::Method;
use serde::Serialize;

use crate::model::Volume;
use crate::resource::VolumeRequest;

use super::{ApiClient, ApiError, VOLUMES_PATH};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVolumeBody<'a> {
    name: &'a str,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateVolumeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl ApiClient {
    /// Creates a volume from `{name, size}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when validation, the request, or decoding fails.
    pub async fn create_volume(&self, request: &VolumeRequest) -> Result<Volume, ApiError> {
        request.validate()?;
        let body = CreateVolumeBody {
            name: &request.name,
            size: request.size_gb,
            description: request.description.as_deref(),
        };
        self.execute(Method::POST, VOLUMES_PATH, Some(&body)).await
    }

    /// Fetches a volume by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the request; a
    /// missing volume reports status 404.
    pub async fn get_volume(&self, volume_id: &str) -> Result<Volume, ApiError> {
        let path = format!("{VOLUMES_PATH}/{volume_id}");
        self.execute(Method::GET, &path, None::<&()>).await
    }

    /// Lists all volumes visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request or decoding fails.
    pub async fn list_volumes(&self) -> Result<Vec<Volume>, ApiError> {
        self.execute(Method::GET, VOLUMES_PATH, None::<&()>).await
    }

    /// Updates a volume's name and/or description.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the update.
    pub async fn update_volume(
        &self,
        volume_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Volume, ApiError> {
        let path = format!("{VOLUMES_PATH}/{volume_id}");
        let body = UpdateVolumeBody { name, description };
        self.execute(Method::PUT, &path, Some(&body)).await
    }

    /// Deletes a volume by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the delete.
    pub async fn delete_volume(&self, volume_id: &str) -> Result<(), ApiError> {
        let path = format!("{VOLUMES_PATH}/{volume_id}");
        self.execute_empty(Method::DELETE, &path, None::<&()>).await
    }
}
