use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::ProfileEntity,
    dto::validation::{validate_logo_data, validate_team_name},
};

/// Public projection of a participant profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileSummary {
    /// User id.
    pub id: Uuid,
    /// Contact email.
    pub email: String,
    /// Team name.
    pub team_name: String,
    /// Logo cells, if uploaded.
    pub team_logo_data: Option<String>,
    /// Season total.
    pub total_yards: i64,
    /// Last change.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ProfileEntity> for ProfileSummary {
    fn from(profile: ProfileEntity) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            team_name: profile.team_name,
            team_logo_data: profile.team_logo_data,
            total_yards: profile.total_yards,
            updated_at: profile.updated_at,
        }
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    /// New team name.
    #[validate(custom(function = "validate_team_name"))]
    pub team_name: Option<String>,
    /// JSON array of 12 colour cells.
    #[validate(custom(function = "validate_logo_data"))]
    pub logo_data: Option<String>,
    /// Only used when the profile does not exist yet.
    #[validate(email)]
    pub email: Option<String>,
}
