//! Response bodies for every endpoint.
//!
//! Field names are part of the public contract and must not change.

use std::collections::BTreeMap;

use {
    axum::{
        Json,
        body::Body,
        http::{HeaderValue, StatusCode, header},
        response::{IntoResponse, Response},
    },
    serde::Serialize,
};

pub const DETAIL_NOT_FOUND: &str = "Skill/Version not found!";
pub const SKILL_NOT_EXISTING: &str = "Skill not existing";

// ── GET /skills/{locale} ────────────────────────────────────────────────────

/// One entry of the skill listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    pub name: String,
    /// On-disk versions that ship the requested locale.
    pub versions: Vec<String>,
    /// Latest tag according to the version index, whatever its locales.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

pub type SkillListing = BTreeMap<String, SkillSummary>;

// ── GET /skill/{skill}/{tag} ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDetail {
    /// `version` from the manifest, whatever its JSON type.
    pub version: serde_json::Value,
    pub locales: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum SkillDetailResponse {
    Found(SkillDetail),
    /// Reported as `{"error": ...}` with HTTP 200.
    NotFound,
}

impl IntoResponse for SkillDetailResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Found(detail) => Json(detail).into_response(),
            Self::NotFound => Json(serde_json::json!({ "error": DETAIL_NOT_FOUND })).into_response(),
        }
    }
}

// ── GET /update/{locale}/{skill}/{version} ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCheck {
    pub update: bool,
    pub version: serde_json::Value,
}

impl UpdateCheck {
    pub fn skill_not_existing() -> Self {
        Self {
            update: false,
            version: SKILL_NOT_EXISTING.into(),
        }
    }

    /// Offer `latest_version` when the latest release ships the client's locale
    /// and its version string differs from the client's.
    ///
    /// Versions are compared as plain strings, so a client reporting a version
    /// the server has never seen is also told to update. A manifest version that
    /// is not a string never equals the client's.
    pub fn decide(
        locale_available: bool,
        latest_version: serde_json::Value,
        client_version: String,
    ) -> Self {
        if locale_available && latest_version.as_str() != Some(client_version.as_str()) {
            Self {
                update: true,
                version: latest_version,
            }
        } else {
            Self {
                update: false,
                version: client_version.into(),
            }
        }
    }
}

// ── GET /download/{skill}/{tag} ─────────────────────────────────────────────

pub enum DownloadResponse {
    Archive { filename: String, body: Body },
    /// Plain-text body with HTTP 200, unlike every other error in the API.
    SkillNotExisting,
}

impl IntoResponse for DownloadResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Archive { filename, body } => {
                let disposition = format!(
                    "attachment; filename=\"{}\"",
                    filename.replace(['"', '\\'], "_")
                );
                let disposition = HeaderValue::from_str(&disposition)
                    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
                (
                    [
                        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    body,
                )
                    .into_response()
            },
            Self::SkillNotExisting => format!("Error: {SKILL_NOT_EXISTING}").into_response(),
        }
    }
}

// ── POST /upload ────────────────────────────────────────────────────────────

/// Why an upload was refused before anything was written, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRejection {
    MissingSkillName,
    MissingVersionTag,
    MissingFile,
    /// Present but unusable as a directory name.
    InvalidSkillName,
    InvalidVersionTag,
}

impl UploadRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingSkillName => "Enter SkillName",
            Self::MissingVersionTag => "Enter Version Tag",
            Self::MissingFile => "No file uploaded",
            Self::InvalidSkillName => "Invalid SkillName",
            Self::InvalidVersionTag => "Invalid Version Tag",
        }
    }
}

#[derive(Serialize)]
struct UploadStatus {
    status: bool,
    message: &'static str,
}

#[derive(Debug)]
pub enum UploadResponse {
    Uploaded,
    /// Reported as `{"status": false, "message": ...}` with HTTP 200.
    Rejected(UploadRejection),
    /// Anything that went wrong after validation.
    Failed { status: StatusCode, message: String },
}

impl UploadResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for UploadResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Uploaded => Json(UploadStatus {
                status: true,
                message: "Skill Uploaded",
            })
            .into_response(),
            Self::Rejected(reason) => Json(UploadStatus {
                status: false,
                message: reason.message(),
            })
            .into_response(),
            Self::Failed { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            },
        }
    }
}
