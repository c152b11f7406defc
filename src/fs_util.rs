use std::fs::{self, File};
use std::io::{self, BufReader};
use std::sync::LazyLock;

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::EnaError;

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// File name stem for a record id. Path separators and other unsafe
/// characters become `_`, and leading dots are dropped.
pub fn file_stem(unique_id: &str) -> String {
    let replaced = UNSAFE_FILE_CHARS.replace_all(unique_id, "_");
    let stem = replaced.trim_start_matches('.');
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem.to_string()
    }
}

pub fn ensure_dir(dir: &Utf8Path) -> Result<(), EnaError> {
    fs::create_dir_all(dir.as_std_path())
        .map_err(|err| EnaError::Filesystem(format!("create {dir}: {err}")))
}

/// Temp file next to `dest`, removed on drop unless persisted.
pub fn temp_file_for(dest: &Utf8Path) -> Result<NamedTempFile, EnaError> {
    let parent = dest
        .parent()
        .ok_or_else(|| EnaError::Filesystem("invalid destination path".to_string()))?;
    let parent = if parent.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        parent
    };
    tempfile::Builder::new()
        .prefix(".ena-fasta")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| EnaError::Filesystem(err.to_string()))
}

pub fn persist(temp: NamedTempFile, dest: &Utf8Path) -> Result<(), EnaError> {
    temp.persist(dest.as_std_path())
        .map_err(|err| EnaError::Filesystem(format!("persist {dest}: {err}")))?;
    Ok(())
}

/// Decompresses `source` into `dest`. Nothing is written to `dest` unless the
/// whole stream decodes.
pub fn gunzip_file(source: &Utf8Path, dest: &Utf8Path) -> Result<u64, EnaError> {
    let input = File::open(source.as_std_path())
        .map_err(|err| EnaError::Filesystem(format!("open {source}: {err}")))?;
    let mut temp = temp_file_for(dest)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(input));
    let written = io::copy(&mut decoder, temp.as_file_mut())
        .map_err(|err| EnaError::Decompress(err.to_string()))?;
    persist(temp, dest)?;
    Ok(written)
}

pub fn remove_file(path: &Utf8Path) -> Result<(), EnaError> {
    fs::remove_file(path.as_std_path())
        .map_err(|err| EnaError::Filesystem(format!("remove {path}: {err}")))
}
