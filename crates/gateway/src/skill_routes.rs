//! Read-only skill endpoints: listing, version detail and update checks.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::Result,
    responses::{SkillDetail, SkillDetailResponse, SkillListing, SkillSummary, UpdateCheck},
    server::AppState,
};

/// `GET /skills/{locale}`
///
/// Lists every visible skill with the versions that ship `locale` and the
/// latest tag from the version index. The two are independent: `latest` may
/// name a version that is not in `versions`.
pub async fn list_skills(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<SkillListing>> {
    let index = state.versions.load().await;
    let mut listing = SkillListing::new();

    for name in state.skills.list_skills().await? {
        let mut versions = Vec::new();
        for tag in state.skills.list_versions(&name).await? {
            if state.skills.has_locale(&name, &tag, &locale).await? {
                versions.push(tag);
            }
        }
        let latest = index.latest(&name).map(ToOwned::to_owned);
        listing.insert(name.clone(), SkillSummary {
            name,
            versions,
            latest,
        });
    }

    Ok(Json(listing))
}

/// `GET /skill/{skill_name}/{version_tag}`
pub async fn skill_detail(
    State(state): State<AppState>,
    Path((skill_name, version_tag)): Path<(String, String)>,
) -> Result<SkillDetailResponse> {
    if state.skills.is_hidden(&skill_name)
        || !state.skills.list_skills().await?.contains(&skill_name)
        || !state
            .skills
            .list_versions(&skill_name)
            .await?
            .contains(&version_tag)
    {
        return Ok(SkillDetailResponse::NotFound);
    }

    let manifest = state.skills.manifest_of(&skill_name, &version_tag).await?;
    let locales = state.skills.locales_of(&skill_name, &version_tag).await?;

    Ok(SkillDetailResponse::Found(SkillDetail {
        version: manifest.version,
        locales,
        dependencies: manifest.dependencies,
    }))
}

/// `GET /update/{locale}/{skill_name}/{version}`
pub async fn check_update(
    State(state): State<AppState>,
    Path((locale, skill_name, version)): Path<(String, String, String)>,
) -> Result<Json<UpdateCheck>> {
    let Some(tag) = state.versions.latest_tag(&skill_name).await else {
        return Ok(Json(UpdateCheck::skill_not_existing()));
    };

    let manifest = state.skills.manifest_of(&skill_name, &tag).await?;
    let locale_available = state.skills.has_locale(&skill_name, &tag, &locale).await?;
    tracing::debug!(
        skill = %skill_name,
        %tag,
        latest = %manifest.version,
        client = %version,
        locale_available,
        "update check"
    );

    Ok(Json(UpdateCheck::decide(
        locale_available,
        manifest.version,
        version,
    )))
}
