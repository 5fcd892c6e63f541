//! Profile CRUD operations against the storage controller.

use reqwest::Method;

use crate::model::Profile;
use crate::resource::ProfileRequest;

use super::{ApiClient, ApiError, PROFILES_PATH};

impl ApiClient {
    /// Creates a profile from a parsed definition.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when validation, the request, or decoding fails.
    pub async fn create_profile(&self, request: &ProfileRequest) -> Result<Profile, ApiError> {
        request.validate()?;
        self.execute(Method::POST, PROFILES_PATH, Some(request)).await
    }

    /// Fetches a profile by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the request.
    pub async fn get_profile(&self, profile_id: &str) -> Result<Profile, ApiError> {
        let path = format!("{PROFILES_PATH}/{profile_id}");
        self.execute(Method::GET, &path, None::<&()>).await
    }

    /// Lists all profiles visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request or decoding fails.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.execute(Method::GET, PROFILES_PATH, None::<&()>).await
    }

    /// Deletes a profile by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the controller rejects the delete.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), ApiError> {
        let path = format!("{PROFILES_PATH}/{profile_id}");
        self.execute_empty(Method::DELETE, &path, None::<&()>).await
    }
}
