//! Working tree conversion
//!
//! Walks an extracted EPUB and converts the files that carry book text:
//!
//! - Files ending in `.html` or `.xhtml` are markup documents. Their whole content,
//!   tags and attributes and embedded scripts included, is passed through the
//!   converter as a single string.
//! - Files ending in `.opf` are package documents, handled by [convert_opf_file].
//! - Everything else is left alone.
//!
//! Suffixes are matched case-sensitively. Files are visited depth first with
//! siblings in file name order, so two runs over the same tree convert the files
//! in the same order.
//!
//! ## Notes
//! - Markup is converted as raw text, not as a parsed document. If the converter
//!   maps a character that appears in a tag name, an attribute value, a
//!   class name or a script, that character is converted too. Links to file names
//!   written in the source script can therefore break.

use std::{fs, path::Path};

use log::info;
use walkdir::WalkDir;

use crate::{
    convert::TextConverter,
    error::EpubError,
    opf::convert_opf_file,
    utils::{DecodeBytes, UTF8_BOM, has_suffix, has_utf8_bom},
};

const MARKUP_SUFFIXES: [&str; 2] = [".html", ".xhtml"];
const PACKAGE_SUFFIXES: [&str; 1] = [".opf"];

/// How a file of the working tree is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// HTML or XHTML document, converted as a whole
    Markup,

    /// OPF package document, converted field by field
    Package,

    /// Any other file; left untouched
    Other,
}

impl ContentKind {
    pub fn of<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if has_suffix(path, &MARKUP_SUFFIXES) {
            ContentKind::Markup
        } else if has_suffix(path, &PACKAGE_SUFFIXES) {
            ContentKind::Package
        } else {
            ContentKind::Other
        }
    }
}

/// Converts every markup and package document below `root_dir`
///
/// The first failing file aborts the walk. The returned error carries that
/// file's path relative to `root_dir`.
///
/// ## Return
/// - `Ok(usize)`: the number of converted files
/// - `Err(EpubError)`: a traversal error, or a `FileOperationFailed` wrapping the
///   error of the file that could not be converted
pub fn transform<P, C>(root_dir: P, converter: &C) -> Result<usize, EpubError>
where
    P: AsRef<Path>,
    C: TextConverter + ?Sized,
{
    let root_dir = root_dir.as_ref();
    let mut converted = 0;

    for entry in WalkDir::new(root_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let result = match ContentKind::of(path) {
            ContentKind::Markup => convert_markup_file(path, converter),
            ContentKind::Package => convert_opf_file(path, converter),
            ContentKind::Other => continue,
        };

        result.map_err(|err| err.at_path(path.strip_prefix(root_dir).unwrap_or(path)))?;
        converted += 1;
    }

    Ok(converted)
}

/// Converts an HTML or XHTML file in place
///
/// The file is decoded (UTF-8, or UTF-16 with a byte order mark), converted as a
/// single string and written back as UTF-8. A leading UTF-8 byte order mark is
/// kept. The file is only overwritten after the conversion has succeeded.
pub fn convert_markup_file<P, C>(path: P, converter: &C) -> Result<(), EpubError>
where
    P: AsRef<Path>,
    C: TextConverter + ?Sized,
{
    let path = path.as_ref();
    info!("Converting: {}", path.display());

    let data = fs::read(path).map_err(|err| EpubError::filesystem(path, err))?;
    let converted = converter.convert(&data.decode()?)?;

    let mut output = Vec::with_capacity(converted.len() + UTF8_BOM.len());
    if has_utf8_bom(&data) {
        output.extend_from_slice(&UTF8_BOM);
    }
    output.extend_from_slice(converted.as_bytes());

    fs::write(path, output).map_err(|err| EpubError::filesystem(path, err))
}
