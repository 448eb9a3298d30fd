use crate::areas::repository::Repository;
use crate::artifacts::compare::file_diff::VersionComparison;
use crate::commands::porcelain::compare::CompareError;
use crate::server::AppState;
use crate::server::error::ApiError;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Welcome to the Git Version Comparison API";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionCompareRequest {
    pub version1: String,
    pub version2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefsResponse {
    pub refs: Vec<String>,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

pub async fn compare_versions(
    State(state): State<AppState>,
    Json(request): Json<VersionCompareRequest>,
) -> Result<Json<VersionComparison>, ApiError> {
    let repository_path = state.repository_path().to_path_buf();

    let comparison = tokio::task::spawn_blocking(move || -> Result<_, CompareError> {
        let repository = Repository::open(&repository_path)?;
        repository.compare_versions(&request.version1, &request.version2)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))??;

    Ok(Json(comparison))
}

pub async fn list_refs(State(state): State<AppState>) -> Result<Json<RefsResponse>, ApiError> {
    let repository_path = state.repository_path().to_path_buf();

    let refs = tokio::task::spawn_blocking(move || -> Result<Vec<String>, CompareError> {
        let repository = Repository::open(&repository_path)?;
        Ok(repository
            .list_refs()?
            .into_iter()
            .map(|name| name.to_string())
            .collect())
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))??;

    Ok(Json(RefsResponse { refs }))
}
