//! User directory and profile endpoints.

use serde::{Deserialize, Serialize};

use causerie_shared::Identity;

use crate::client::ApiClient;
use crate::error::Result;

/// Editable profile fields, as the backend stores them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Partial profile update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<Identity>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: Profile,
}

impl ApiClient {
    /// Everyone registered with the backend, for the "start a chat" picker.
    ///
    /// `GET /user/all`
    pub async fn all_users(&self) -> Result<Vec<Identity>> {
        let resp: UsersResponse = self.get_json("/user/all").await?;
        Ok(resp.users)
    }

    /// `GET /user/profile`
    pub async fn get_profile(&self) -> Result<Profile> {
        let resp: ProfileResponse = self.get_json("/user/profile").await?;
        Ok(resp.user)
    }

    /// `PUT /user/update`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        let resp: ProfileResponse = self.put_json("/user/update", update).await?;
        Ok(resp.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_tolerates_missing_fields() {
        let resp: ProfileResponse =
            serde_json::from_str(r#"{"user": {"name": "Ada"}}"#).unwrap();
        assert_eq!(resp.user.name, "Ada");
        assert!(resp.user.bio.is_none());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("salut".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
        assert_eq!(json["bio"], "salut");
    }
}
