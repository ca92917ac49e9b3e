use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::ProfileEntity,
    dto::profile::{ProfileSummary, UpdateProfileRequest},
    error::ServiceError,
    state::SharedState,
};

/// Profile of the user, `NotFound` before the first update.
pub async fn get_profile(state: &SharedState, user_id: Uuid) -> Result<ProfileSummary, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_profile(user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("profile {user_id} not found")))
}

/// Apply a partial update; the first update creates the profile and must carry an email.
pub async fn update_profile(
    state: &SharedState,
    user_id: Uuid,
    request: UpdateProfileRequest,
) -> Result<ProfileSummary, ServiceError> {
    request.validate()?;
    let store = state.require_store().await?;
    let now = state.now();

    let mut profile = match store.find_profile(user_id).await? {
        Some(profile) => profile,
        None => {
            let email = request.email.clone().ok_or_else(|| {
                ServiceError::InvalidInput("email is required to create a profile".into())
            })?;
            info!(%user_id, "creating profile");
            ProfileEntity {
                id: user_id,
                team_name: default_team_name(&email),
                email,
                team_logo_data: None,
                total_yards: 0,
                created_at: now,
                updated_at: now,
            }
        }
    };

    if let Some(team_name) = request.team_name {
        profile.team_name = team_name.trim().to_string();
    }
    if let Some(logo_data) = request.logo_data {
        profile.team_logo_data = Some(logo_data);
    }
    profile.updated_at = now;

    store.save_profile(profile.clone()).await?;
    Ok(profile.into())
}

fn default_team_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default().trim();
    let name: String = local.chars().take(50).collect();
    if name.is_empty() {
        "Rushing Squad".to_string()
    } else {
        name
    }
}
