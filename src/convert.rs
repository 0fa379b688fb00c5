//! Text conversion
//!
//! The [TextConverter] trait is the seam between the EPUB pipeline and the script
//! conversion itself. The pipeline only ever asks for "this string, converted";
//! how that happens is up to the implementation.
//!
//! This module ships one implementation, [ScriptConverter], backed by the `zhconv`
//! dictionaries (MediaWiki and OpenCC derived, phrase aware). A [Ruleset] selects
//! the target variant; the matching dictionary automaton is resolved once when the
//! converter is created and reused for every string of a run.
//!
//! ## Notes
//! - Conversion is not assumed to be idempotent. Running a converter over text it
//!   has already converted may or may not change it again, depending on the
//!   dictionaries.

use std::{fmt, str::FromStr};

use zhconv::{Variant, ZhConverter, get_builtin_converter};

use crate::error::EpubError;

/// Converts a piece of text from one script variant to another
pub trait TextConverter {
    /// Returns the converted text, or a `ConversionError` when the text cannot be converted
    fn convert(&self, text: &str) -> Result<String, EpubError>;
}

impl<F> TextConverter for F
where
    F: Fn(&str) -> Result<String, EpubError>,
{
    fn convert(&self, text: &str) -> Result<String, EpubError> {
        self(text)
    }
}

/// Named conversion directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ruleset {
    /// Traditional Chinese to Simplified Chinese (`t2s`)
    TraditionalToSimplified,

    /// Simplified Chinese to Traditional Chinese (`s2t`)
    SimplifiedToTraditional,
}

impl Ruleset {
    /// The short name of the ruleset
    pub fn name(&self) -> &'static str {
        match self {
            Ruleset::TraditionalToSimplified => "t2s",
            Ruleset::SimplifiedToTraditional => "s2t",
        }
    }

    fn target(&self) -> Variant {
        match self {
            Ruleset::TraditionalToSimplified => Variant::ZhHans,
            Ruleset::SimplifiedToTraditional => Variant::ZhHant,
        }
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ruleset {
    type Err = EpubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t2s" | "traditional-to-simplified" => Ok(Ruleset::TraditionalToSimplified),
            "s2t" | "simplified-to-traditional" => Ok(Ruleset::SimplifiedToTraditional),
            _ => Err(EpubError::UnsupportedRuleset {
                ruleset: s.to_string(),
            }),
        }
    }
}

/// Dictionary based converter for a [Ruleset]
#[derive(Clone, Copy)]
pub struct ScriptConverter {
    ruleset: Ruleset,
    converter: &'static ZhConverter,
}

impl ScriptConverter {
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            converter: get_builtin_converter(ruleset.target()),
        }
    }

    /// Resolves a ruleset name and builds its converter
    pub fn from_name(name: &str) -> Result<Self, EpubError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }
}

impl fmt::Debug for ScriptConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptConverter")
            .field("ruleset", &self.ruleset)
            .finish_non_exhaustive()
    }
}

impl TextConverter for ScriptConverter {
    fn convert(&self, text: &str) -> Result<String, EpubError> {
        Ok(self.converter.convert(text))
    }
}
