use std::io::Seek;

use {
    axum::{
        body::Body,
        extract::{Path, State},
    },
    tokio_util::io::ReaderStream,
    tracing::info,
};

use skillrack_registry::archive;

use crate::{error::Result, responses::DownloadResponse, server::AppState};

/// Tag value that resolves through the version index.
const LATEST: &str = "latest";

/// `GET /download/{skill_name}/{version_tag}`
///
/// Streams `<skill_name>.zip` containing the version directory under a
/// top-level entry named after the tag. Explicit tags are not checked against
/// the version index.
pub async fn download(
    State(state): State<AppState>,
    Path((skill_name, version_tag)): Path<(String, String)>,
) -> Result<DownloadResponse> {
    let tag = if version_tag == LATEST {
        state.versions.latest_tag(&skill_name).await
    } else {
        Some(version_tag)
    };
    let Some(tag) = tag else {
        return Ok(DownloadResponse::SkillNotExisting);
    };

    let dir = match state.skills.version_dir(&skill_name, &tag) {
        Ok(dir) => dir,
        Err(e) => {
            tracing::debug!(skill = %skill_name, %tag, error = %e, "refusing download");
            return Ok(DownloadResponse::SkillNotExisting);
        },
    };

    // Spool to an anonymous temp file so large versions are not held in memory.
    let entry_name = tag.clone();
    let packaged = tokio::task::spawn_blocking(move || {
        let file = tempfile::tempfile()?;
        let mut file = archive::package_directory(&dir, &entry_name, file)?;
        file.rewind()?;
        Ok::<_, skillrack_registry::Error>(file)
    })
    .await?;

    let file = match packaged {
        Ok(file) => file,
        Err(e) if e.is_not_found() => return Ok(DownloadResponse::SkillNotExisting),
        Err(e) => return Err(e.into()),
    };

    info!(skill = %skill_name, %tag, "serving skill archive");
    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Ok(DownloadResponse::Archive {
        filename: format!("{skill_name}.zip"),
        body: Body::from_stream(stream),
    })
}
