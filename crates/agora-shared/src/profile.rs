use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::Gender;
use crate::validation::validate_phone_number;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub profile_photo: Option<String>,
    pub phone_number: Option<String>,
    pub about_me: String,
    pub gender: Gender,
    pub country: Option<String>,
    pub city: Option<String>,
    pub twitter_handle: Option<String>,
    pub facebook_handle: Option<String>,
    pub instagram_handle: Option<String>,
    /// Whether the requesting user follows this profile.
    pub following: bool,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 500))]
    pub profile_photo: Option<String>,
    #[validate(length(max = 2000))]
    pub about_me: Option<String>,
    pub gender: Option<Gender>,
    #[validate(length(min = 2, max = 60))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 180))]
    pub city: Option<String>,
    #[validate(length(max = 20))]
    pub twitter_handle: Option<String>,
    #[validate(length(max = 20))]
    pub facebook_handle: Option<String>,
    #[validate(length(max = 20))]
    pub instagram_handle: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.phone_number.is_none()
            && self.profile_photo.is_none()
            && self.about_me.is_none()
            && self.gender.is_none()
            && self.country.is_none()
            && self.city.is_none()
            && self.twitter_handle.is_none()
            && self.facebook_handle.is_none()
            && self.instagram_handle.is_none()
    }
}

/// Row in a following / followers listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEntry {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo: Option<String>,
    pub about_me: String,
    pub twitter_handle: Option<String>,
    pub facebook_handle: Option<String>,
    pub instagram_handle: Option<String>,
    pub following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowList {
    pub username: String,
    pub count: usize,
    pub results: Vec<FollowEntry>,
}
