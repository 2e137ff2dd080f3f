//! Skill upload endpoint.
//!
//! `POST /upload` takes a multipart form with text fields `skillName` and
//! `versionTag` and a file field `zipped`. The archive is unpacked into
//! `<skills>/<skillName>/<versionTag>/` (overwriting) and the tag becomes the
//! skill's latest entry in the version index.
//!
//! The text fields may also arrive as a urlencoded or JSON body. Such a body
//! cannot carry the archive, so it is refused with "No file uploaded".

use {
    axum::{
        Form, Json,
        body::Bytes,
        extract::{
            FromRequest, Request, State,
            multipart::{Multipart, MultipartError},
        },
        http::header,
    },
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use skillrack_registry::{archive, repository::valid_segment};

use crate::{
    responses::{UploadRejection, UploadResponse},
    server::AppState,
};

const SKILL_NAME_FIELD: &str = "skillName";
const VERSION_TAG_FIELD: &str = "versionTag";
const ARCHIVE_FIELD: &str = "zipped";

/// Text fields of a urlencoded or JSON body.
#[derive(Debug, Default, Deserialize)]
struct TextFields {
    #[serde(rename = "skillName")]
    skill_name: Option<String>,
    #[serde(rename = "versionTag")]
    version_tag: Option<String>,
}

/// Body encodings the upload endpoint understands.
enum BodyKind {
    Multipart,
    UrlEncoded,
    Json,
    Other,
}

impl BodyKind {
    fn of(request: &Request) -> Self {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        match mime {
            "multipart/form-data" => Self::Multipart,
            "application/x-www-form-urlencoded" => Self::UrlEncoded,
            m if m == "application/json" || m.ends_with("+json") => Self::Json,
            _ => Self::Other,
        }
    }
}

/// Fields collected from the request body.
#[derive(Debug, Default)]
struct UploadForm {
    skill_name: Option<String>,
    version_tag: Option<String>,
    /// Every file part, keyed by field name.
    files: Vec<(String, Bytes)>,
}

impl From<TextFields> for UploadForm {
    fn from(fields: TextFields) -> Self {
        Self {
            skill_name: fields.skill_name,
            version_tag: fields.version_tag,
            files: Vec::new(),
        }
    }
}

impl UploadForm {
    /// Read the form from any supported body. A body that cannot be parsed
    /// carries no fields.
    async fn extract(request: Request, state: &AppState) -> Result<Self, MultipartError> {
        match BodyKind::of(&request) {
            BodyKind::Multipart => match Multipart::from_request(request, state).await {
                Ok(multipart) => Self::read(multipart).await,
                Err(e) => {
                    debug!(error = %e, "unreadable multipart upload body");
                    Ok(Self::default())
                },
            },
            BodyKind::UrlEncoded => Ok(Form::<TextFields>::from_request(request, state)
                .await
                .map(|Form(fields)| Self::from(fields))
                .unwrap_or_default()),
            BodyKind::Json => Ok(Json::<TextFields>::from_request(request, state)
                .await
                .map(|Json(fields)| Self::from(fields))
                .unwrap_or_default()),
            BodyKind::Other => Ok(Self::default()),
        }
    }

    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                let data = field.bytes().await?;
                form.files.push((name, data));
                continue;
            }
            match name.as_str() {
                SKILL_NAME_FIELD => form.skill_name = Some(field.text().await?),
                VERSION_TAG_FIELD => form.version_tag = Some(field.text().await?),
                _ => {},
            }
        }
        Ok(form)
    }

    /// Check fields in order and stop at the first problem.
    fn validate(self) -> Result<(String, String, Vec<(String, Bytes)>), UploadRejection> {
        let skill_name = self
            .skill_name
            .filter(|s| !s.is_empty())
            .ok_or(UploadRejection::MissingSkillName)?;
        let version_tag = self
            .version_tag
            .filter(|s| !s.is_empty())
            .ok_or(UploadRejection::MissingVersionTag)?;
        if self.files.is_empty() {
            return Err(UploadRejection::MissingFile);
        }
        valid_segment(&skill_name).map_err(|_| UploadRejection::InvalidSkillName)?;
        valid_segment(&version_tag).map_err(|_| UploadRejection::InvalidVersionTag)?;
        Ok((skill_name, version_tag, self.files))
    }
}

/// `POST /upload`
pub async fn upload(State(state): State<AppState>, request: Request) -> UploadResponse {
    let form = match UploadForm::extract(request, &state).await {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "failed to read upload form");
            return UploadResponse::Failed {
                status: e.status(),
                message: e.body_text(),
            };
        },
    };

    let (skill_name, version_tag, files) = match form.validate() {
        Ok(fields) => fields,
        Err(rejection) => return UploadResponse::Rejected(rejection),
    };

    let Some((_, data)) = files.into_iter().find(|(name, _)| name == ARCHIVE_FIELD) else {
        return UploadResponse::failed(format!("missing file field '{ARCHIVE_FIELD}'"));
    };

    let dest = match state.skills.version_dir(&skill_name, &version_tag) {
        Ok(dest) => dest,
        Err(e) => return UploadResponse::failed(e.to_string()),
    };

    let extracted =
        tokio::task::spawn_blocking(move || archive::extract(&data, &dest)).await;
    let files_written = match extracted {
        Ok(Ok(count)) => count,
        Ok(Err(e)) => {
            warn!(skill = %skill_name, tag = %version_tag, error = %e, "failed to extract upload");
            return UploadResponse::failed(e.to_string());
        },
        Err(e) => return UploadResponse::failed(e.to_string()),
    };

    if let Err(e) = state.versions.record_upload(&skill_name, &version_tag).await {
        warn!(skill = %skill_name, tag = %version_tag, error = %e, "failed to record upload");
        return UploadResponse::failed(e.to_string());
    }

    info!(skill = %skill_name, tag = %version_tag, files = files_written, "skill uploaded");
    UploadResponse::Uploaded
}
