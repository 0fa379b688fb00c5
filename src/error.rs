//! Error Type Definition Module
//!
//! This module defines the error types that may be encountered while converting
//! an EPUB file. All errors are uniformly wrapped in the `EpubError` enumeration
//! so the caller can report a single human-readable message for a failed run.
//!
//! ## Main Error Types
//!
//! - [EpubError] - Enumeration of errors raised by every stage of the conversion
//! - [Stage] - The pipeline stage an error is attributed to

use std::fmt;

use thiserror::Error;

/// Stages of a conversion run
///
/// Used to annotate errors returned by the pipeline with the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validating the input and allocating the working tree
    Setup,

    /// Unpacking the input archive into the working tree
    Extract,

    /// Converting the markup and package documents of the working tree
    Transform,

    /// Repacking the working tree into the output archive
    Build,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Build => "build",
        };

        f.write_str(name)
    }
}

/// Types of errors that can occur during EPUB conversion
#[derive(Debug, Error)]
pub enum EpubError {
    /// Archive read error
    ///
    /// The input is not a valid ZIP container, or one of its entries
    /// cannot be decompressed.
    #[error("Archive read error: {source}")]
    ArchiveReadError { source: zip::result::ZipError },

    /// Archive write error
    ///
    /// The output container cannot be created, written or finalized.
    #[error("Archive write error: {source}")]
    ArchiveWriteError { source: zip::result::ZipError },

    /// Text conversion error
    ///
    /// Raised by a `TextConverter` when it cannot convert the given text.
    #[error("Conversion error: The \"{ruleset}\" ruleset failed to convert text: {reason}")]
    ConversionError { ruleset: String, reason: String },

    /// File operation error
    ///
    /// Wraps an error raised while handling a single file of the working tree
    /// and attaches the offending path.
    #[error("Failed to process \"{path}\": {source}")]
    FileOperationFailed {
        path: String,
        source: Box<EpubError>,
    },

    #[error("Filesystem error: \"{path}\": {source}")]
    FilesystemError {
        path: String,
        source: std::io::Error,
    },

    #[error("Input not found: The \"{path}\" file does not exist.")]
    InputNotFound { path: String },

    /// Missing required attribute error
    ///
    /// Triggered when a manifest item or spine itemref lacks an attribute
    /// the package document model relies on.
    #[error(
        "Missing required attribute: The \"{attribute}\" attribute is a must attribute for the \"{tag}\" element."
    )]
    MissingRequiredAttribute { tag: String, attribute: String },

    /// Package document parsing error
    ///
    /// The OPF file is not well-formed, or lacks the `package` root element.
    #[error("Metadata parse error: {reason}")]
    MetadataParseError { reason: String },

    /// Package document serialization error
    #[error("Metadata write error: {reason}")]
    MetadataWriteError { reason: String },

    /// Relative link leak error
    ///
    /// This error occurs when an archive entry name points outside
    /// the directory it is extracted into.
    #[error("Relative link leakage: Path \"{path}\" is out of container range.")]
    RelativeLinkLeakage { path: String },

    /// Stage error
    ///
    /// Returned by the pipeline to report which stage of the run failed.
    #[error("The {stage} stage failed: {source}")]
    StageFailed { stage: Stage, source: Box<EpubError> },

    #[error("Unsupported ruleset: The \"{ruleset}\" ruleset is not supported.")]
    UnsupportedRuleset { ruleset: String },

    /// UTF-8 decoding error
    ///
    /// This error occurs when a markup file is not valid UTF-8 text.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },

    /// UTF-16 decoding error
    ///
    /// This error occurs when a markup file starts with a UTF-16 byte order mark
    /// but the data that follows is not valid UTF-16, or has an odd length.
    #[error("Decode error: {reason}")]
    Utf16DecodeError { reason: String },

    /// WalkDir error
    ///
    /// This error occurs when using the WalkDir library to traverse the working tree.
    #[error("WalkDir error: {source}")]
    WalkDirError { source: walkdir::Error },
}

impl EpubError {
    /// Attaches a path to an error raised while handling that file
    pub fn at_path(self, path: impl AsRef<std::path::Path>) -> Self {
        EpubError::FileOperationFailed {
            path: path.as_ref().display().to_string(),
            source: Box::new(self),
        }
    }

    /// Attributes an error to a pipeline stage
    pub fn in_stage(self, stage: Stage) -> Self {
        EpubError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// Builds a `FilesystemError` for the given path
    pub fn filesystem(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        EpubError::FilesystemError {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Returns the innermost error, skipping path and stage annotations
    pub fn root_cause(&self) -> &EpubError {
        match self {
            EpubError::FileOperationFailed { source, .. }
            | EpubError::StageFailed { source, .. } => source.root_cause(),
            _ => self,
        }
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(value: quick_xml::Error) -> Self {
        EpubError::MetadataParseError {
            reason: value.to_string(),
        }
    }
}

impl From<quick_xml::escape::EscapeError> for EpubError {
    fn from(value: quick_xml::escape::EscapeError) -> Self {
        EpubError::MetadataParseError {
            reason: value.to_string(),
        }
    }
}

impl From<std::string::FromUtf8Error> for EpubError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        EpubError::Utf8DecodeError { source: value }
    }
}

impl From<std::string::FromUtf16Error> for EpubError {
    fn from(value: std::string::FromUtf16Error) -> Self {
        EpubError::Utf16DecodeError {
            reason: value.to_string(),
        }
    }
}

impl From<walkdir::Error> for EpubError {
    fn from(value: walkdir::Error) -> Self {
        EpubError::WalkDirError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for EpubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::ConversionError {
                    ruleset: l_ruleset,
                    reason: l_reason,
                },
                Self::ConversionError {
                    ruleset: r_ruleset,
                    reason: r_reason,
                },
            ) => l_ruleset == r_ruleset && l_reason == r_reason,
            (
                Self::FileOperationFailed {
                    path: l_path,
                    source: l_source,
                },
                Self::FileOperationFailed {
                    path: r_path,
                    source: r_source,
                },
            ) => l_path == r_path && l_source == r_source,
            (Self::InputNotFound { path: l_path }, Self::InputNotFound { path: r_path }) => {
                l_path == r_path
            }
            (
                Self::MissingRequiredAttribute {
                    tag: l_tag,
                    attribute: l_attribute,
                },
                Self::MissingRequiredAttribute {
                    tag: r_tag,
                    attribute: r_attribute,
                },
            ) => l_tag == r_tag && l_attribute == r_attribute,
            (
                Self::RelativeLinkLeakage { path: l_path },
                Self::RelativeLinkLeakage { path: r_path },
            ) => l_path == r_path,
            (
                Self::StageFailed {
                    stage: l_stage,
                    source: l_source,
                },
                Self::StageFailed {
                    stage: r_stage,
                    source: r_source,
                },
            ) => l_stage == r_stage && l_source == r_source,
            (
                Self::UnsupportedRuleset { ruleset: l_ruleset },
                Self::UnsupportedRuleset { ruleset: r_ruleset },
            ) => l_ruleset == r_ruleset,
            (
                Self::Utf8DecodeError { source: l_source },
                Self::Utf8DecodeError { source: r_source },
            ) => l_source == r_source,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}
