//! Zip codec for skill versions.
//!
//! Uploads arrive as a zip whose entries are relative to the version directory.
//! Downloads wrap the version directory in a single top-level entry named after
//! the tag, so `v2/manifest.json` rather than `manifest.json`.

use std::{
    fs::File,
    io::{Cursor, Read, Seek, Write},
    path::{Path, PathBuf},
};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::error::{Error, Result};

/// Unpack `bytes` into `destination`, overwriting files that already exist.
///
/// Returns the number of files written. Entries that would land outside
/// `destination` abort the extraction; files written before that point stay.
pub fn extract(bytes: &[u8], destination: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    std::fs::create_dir_all(destination)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::message(format!(
                "archive entry escapes destination: {}",
                entry.name()
            )));
        };
        let target = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    tracing::debug!(files = written, destination = %destination.display(), "extracted archive");
    Ok(written)
}

/// Write a zip of `source_dir` to `writer`, nesting every file under
/// `entry_name/`. Symlinks are skipped.
pub fn package_directory<W: Write + Seek>(
    source_dir: &Path,
    entry_name: &str,
    writer: W,
) -> Result<W> {
    if !source_dir.is_dir() {
        return Err(Error::not_found(format!(
            "directory {}",
            source_dir.display()
        )));
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    zip.add_directory(format!("{entry_name}/"), options)?;

    let mut buf = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source_dir)?;
        let name = archive_name(entry_name, relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if file_type.is_file() {
            zip.start_file(name, options)?;
            buf.clear();
            File::open(entry.path())?.read_to_end(&mut buf)?;
            zip.write_all(&buf)?;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    Ok(zip.finish()?)
}

/// Zip entry names always use `/`, whatever the host separator.
fn archive_name(entry_name: &str, relative: &Path) -> String {
    let mut name = entry_name.to_string();
    for part in relative.components() {
        name.push('/');
        name.push_str(&part.as_os_str().to_string_lossy());
    }
    name
}

/// Relative paths of every regular file under `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir)?.to_path_buf());
        }
    }
    Ok(files)
}
