//! Volume snapshot CRUD operations against the storage controller.

use reqwest::Method;
use serde::Serialize;

use crate::model::VolumeSnapshot;

use super::{ApiClient, ApiError, SNAPSHOTS_PATH};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSnapshotBody<'a> {
    volume_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSnapshotBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl ApiClient {
    /// Creates a snapshot of the given volume.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the request.
    pub async fn create_snapshot(
        &self,
        volume_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<VolumeSnapshot, ApiError> {
        let body = CreateSnapshotBody {
            volume_id,
            name,
            description,
        };
        self.execute(Method::POST, SNAPSHOTS_PATH, Some(&body)).await
    }

    /// Fetches a snapshot by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the request.
    pub async fn get_snapshot(&self, snapshot_id: &str) -> Result<VolumeSnapshot, ApiError> {
        let path = format!("{SNAPSHOTS_PATH}/{snapshot_id}");
        self.execute(Method::GET, &path, None::<&()>).await
    }

    /// Lists all snapshots visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request or decoding fails.
    pub async fn list_snapshots(&self) -> Result<Vec<VolumeSnapshot>, ApiError> {
        self.execute(Method::GET, SNAPSHOTS_PATH, None::<&()>).await
    }

    /// Updates a snapshot's name and/or description.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the update.
    pub async fn update_snapshot(
        &self,
        snapshot_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<VolumeSnapshot, ApiError> {
        let path = format!("{SNAPSHOTS_PATH}/{snapshot_id}");
        let body = UpdateSnapshotBody { name, description };
        self.execute(Method::PUT, &path, Some(&body)).await
    }

    /// Deletes a snapshot by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the delete.
    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ApiError> {
        let path = format!("{SNAPSHOTS_PATH}/{snapshot_id}");
        self.execute_empty(Method::DELETE, &path, None::<&()>).await
    }
}
