//! Archive extraction and packing
//!
//! An EPUB is a ZIP container. This module moves it between its packed form and a
//! directory tree on disk:
//!
//! - [extract] unpacks every entry of a container into a directory, keeping the
//!   relative paths and the declared unix permissions of the entries.
//! - [build] walks a directory and packs it into a new container. The `mimetype`
//!   file, when present at the root, is written first and uncompressed; every other
//!   file is deflated. Entries are ordered by path so the same tree always produces
//!   the same archive.
//! - [read_archive] loads all entries of a container into memory.

use std::{
    fs::{self, File},
    io::{self, BufReader, Read},
    path::Path,
};

use log::{debug, warn};
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions};

use crate::error::EpubError;

const MIMETYPE_FILE: &str = "mimetype";

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// A single entry of a ZIP container
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Forward-slash separated path; directories end with `/`
    pub path: String,

    /// Decompressed payload; always empty for directories
    pub data: Vec<u8>,
    pub is_dir: bool,

    /// Unix permission bits, when the container records them
    pub mode: Option<u32>,

    pub compression: CompressionMethod,
}

/// Unpacks a ZIP container into a directory
///
/// Directory entries are created with all of their parents. File entries are
/// written to `dest_dir/<entry path>` and receive the permission bits the entry
/// declares. Owner read and write are always granted so the extracted tree can
/// be rewritten afterwards.
///
/// ## Errors
/// - `FilesystemError`: the input cannot be opened, or a path cannot be created
/// - `ArchiveReadError`: the input is not a ZIP container, or an entry cannot be decompressed
/// - `RelativeLinkLeakage`: an entry name points outside `dest_dir`
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    dest_dir: Q,
) -> Result<(), EpubError> {
    let archive_path = archive_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    let file = File::open(archive_path).map_err(|err| EpubError::filesystem(archive_path, err))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(read_error)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(read_error)?;
        let relative_path = entry
            .enclosed_name()
            .ok_or_else(|| EpubError::RelativeLinkLeakage {
                path: entry.name().to_string(),
            })?;
        let target_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            debug!("Creating directory: {}", target_path.display());
            fs::create_dir_all(&target_path)
                .map_err(|err| EpubError::filesystem(&target_path, err))?;
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|err| read_error(ZipError::from(err)))?;

        if let Some(parent_dir) = target_path.parent() {
            fs::create_dir_all(parent_dir).map_err(|err| EpubError::filesystem(parent_dir, err))?;
        }

        debug!("Extracting: {}", target_path.display());
        fs::write(&target_path, buf).map_err(|err| EpubError::filesystem(&target_path, err))?;

        if let Some(mode) = entry.unix_mode() {
            set_file_mode(&target_path, mode)?;
        }
    }

    Ok(())
}

/// Packs a directory into a new ZIP container
///
/// Directories are stored as entries with a trailing slash and no payload. Files
/// are deflated, except for a root level `mimetype` file which is stored first and
/// uncompressed. Siblings are visited in file name order.
///
/// The destination's parent directory is created when missing. When packing
/// fails, the partially written destination is removed; callers must not use it.
///
/// ## Errors
/// - `ArchiveWriteError`: any failure while creating, writing or finalizing the container
/// - `WalkDirError`: the source directory cannot be traversed
pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(src_dir: P, dest_path: Q) -> Result<(), EpubError> {
    let dest_path = dest_path.as_ref();

    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(write_io_error)?;
        }
    }

    let file = File::create(dest_path).map_err(write_io_error)?;
    let result = write_archive(src_dir.as_ref(), ZipWriter::new(file));

    if result.is_err() {
        if let Err(err) = fs::remove_file(dest_path) {
            warn!(
                "Failed to remove incomplete archive {}: {}",
                dest_path.display(),
                err
            );
        }
    }

    result
}

fn write_archive(src_dir: &Path, mut zip: ZipWriter<File>) -> Result<(), EpubError> {
    let mimetype_path = src_dir.join(MIMETYPE_FILE);
    if mimetype_path.is_file() {
        let mode = fs::metadata(&mimetype_path)
            .map(|metadata| file_mode(&metadata, DEFAULT_FILE_MODE))
            .map_err(write_io_error)?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(mode);

        debug!("Packing: {}", MIMETYPE_FILE);
        zip.start_file(MIMETYPE_FILE, options).map_err(write_error)?;
        let mut source = File::open(&mimetype_path).map_err(write_io_error)?;
        io::copy(&mut source, &mut zip).map_err(write_io_error)?;
    }

    for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        if path == mimetype_path {
            continue;
        }

        let relative_path = path
            .strip_prefix(src_dir)
            .map_err(|_| EpubError::RelativeLinkLeakage {
                path: path.display().to_string(),
            })?;
        let target_path = relative_path.to_string_lossy().replace('\\', "/");
        let metadata = entry.metadata()?;

        if metadata.is_dir() {
            let options = SimpleFileOptions::default()
                .unix_permissions(file_mode(&metadata, DEFAULT_DIR_MODE));

            debug!("Packing: {}/", target_path);
            zip.add_directory(format!("{}/", target_path), options)
                .map_err(write_error)?;
        } else if metadata.is_file() {
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(file_mode(&metadata, DEFAULT_FILE_MODE));

            debug!("Packing: {}", target_path);
            zip.start_file(target_path, options).map_err(write_error)?;
            let mut source = File::open(path).map_err(write_io_error)?;
            io::copy(&mut source, &mut zip).map_err(write_io_error)?;
        } else {
            warn!("Skipping non-regular file: {}", path.display());
        }
    }

    zip.finish().map_err(write_error)?;
    Ok(())
}

/// Loads every entry of a ZIP container, in container order
pub fn read_archive<P: AsRef<Path>>(archive_path: P) -> Result<Vec<ArchiveEntry>, EpubError> {
    let archive_path = archive_path.as_ref();
    let file = File::open(archive_path).map_err(|err| EpubError::filesystem(archive_path, err))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(read_error)?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(read_error)?;

        let mut data = Vec::new();
        if !entry.is_dir() {
            entry
                .read_to_end(&mut data)
                .map_err(|err| read_error(ZipError::from(err)))?;
        }

        entries.push(ArchiveEntry {
            path: entry.name().to_string(),
            data,
            is_dir: entry.is_dir(),
            mode: entry.unix_mode().map(|mode| mode & 0o7777),
            compression: entry.compression(),
        });
    }

    Ok(entries)
}

fn read_error(source: ZipError) -> EpubError {
    EpubError::ArchiveReadError { source }
}

fn write_error(source: ZipError) -> EpubError {
    EpubError::ArchiveWriteError { source }
}

fn write_io_error(source: io::Error) -> EpubError {
    write_error(ZipError::from(source))
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> Result<(), EpubError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode((mode & 0o777) | 0o600);
    fs::set_permissions(path, permissions).map_err(|err| EpubError::filesystem(path, err))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> Result<(), EpubError> {
    Ok(())
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata, _default: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata, default: u32) -> u32 {
    default
}
