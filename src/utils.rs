use std::path::Path;

use crate::error::EpubError;

pub(crate) const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Provides functionality to decode byte data into strings
///
/// This trait decodes the raw bytes of a text file taken from an EPUB container.
/// It detects the byte order mark of UTF-8, UTF-16 BE and UTF-16 LE data and
/// strips it from the result.
///
/// ## Notes
/// - Data without a BOM must be valid UTF-8. Unlike a lossy decode, this keeps
///   the conversion from silently replacing bytes it does not understand.
pub trait DecodeBytes {
    fn decode(&self) -> Result<String, EpubError>;
}

impl DecodeBytes for [u8] {
    fn decode(&self) -> Result<String, EpubError> {
        match self {
            [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).map_err(EpubError::from),

            [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
            [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),

            _ => String::from_utf8(self.to_vec()).map_err(EpubError::from),
        }
    }
}

fn decode_utf16(data: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, EpubError> {
    if data.len() % 2 != 0 {
        return Err(EpubError::Utf16DecodeError {
            reason: format!("UTF-16 data has an odd length of {} bytes", data.len()),
        });
    }

    let utf16_units: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| to_unit([b[0], b[1]]))
        .collect();

    String::from_utf16(&utf16_units).map_err(EpubError::from)
}

impl DecodeBytes for Vec<u8> {
    fn decode(&self) -> Result<String, EpubError> {
        self.as_slice().decode()
    }
}

/// Returns true when the data starts with a UTF-8 byte order mark
pub(crate) fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&UTF8_BOM)
}

/// Checks whether the file name ends with one of the given suffixes
///
/// The comparison is case-sensitive: `chapter.XHTML` does not match `.xhtml`.
pub(crate) fn has_suffix(path: &Path, suffixes: &[&str]) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        error::EpubError,
        utils::{DecodeBytes, has_suffix, has_utf8_bom},
    };

    #[test]
    fn test_decode_empty_data() {
        let data: Vec<u8> = vec![];
        assert_eq!(data.decode().unwrap(), "");
    }

    /// Testing text decoding with UTF-8 BOM
    #[test]
    fn test_decode_utf8_with_bom() {
        let data: Vec<u8> = vec![0xEF, 0xBB, 0xBF, b'H', b'e', b'l', b'l', b'o'];
        let result = data.decode();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Hello");
        assert!(has_utf8_bom(&data));
    }

    /// Test text decoding with UTF-16 BE BOM
    #[test]
    fn test_decode_utf16_be_with_bom() {
        let data = vec![
            0xFE, 0xFF, // BOM
            0x00, b'H', // H
            0x00, b'e', // e
            0x00, b'l', // l
            0x00, b'l', // l
            0x00, b'o', // o
        ];
        let result = data.decode();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Hello");
        assert!(!has_utf8_bom(&data));
    }

    /// Testing text decoding with UTF-16 LE BOM
    #[test]
    fn test_decode_utf16_le_with_bom() {
        let data = vec![
            0xFF, 0xFE, // BOM
            0x2D, 0x4E, // 中
            0x87, 0x65, // 文
        ];
        let result = data.decode();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "中文");
    }

    #[test]
    fn test_decode_utf16_odd_length() {
        let data = vec![
            0xFF, 0xFE, // BOM
            0x2D, 0x4E, // 中
            0x87, // truncated
        ];
        let result = data.decode();
        assert!(matches!(
            result.unwrap_err(),
            EpubError::Utf16DecodeError { .. }
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let data = vec![b'a', 0xC3, 0x28, b'b'];
        let result = data.decode();
        assert!(matches!(
            result.unwrap_err(),
            EpubError::Utf8DecodeError { .. }
        ));
    }

    #[test]
    fn test_has_suffix() {
        assert!(has_suffix(Path::new("OEBPS/ch1.xhtml"), &[".html", ".xhtml"]));
        assert!(has_suffix(Path::new("index.html"), &[".html", ".xhtml"]));
        assert!(!has_suffix(Path::new("OEBPS/ch1.XHTML"), &[".html", ".xhtml"]));
        assert!(!has_suffix(Path::new("cover.jpg"), &[".html", ".xhtml"]));
        assert!(has_suffix(Path::new("content.opf"), &[".opf"]));
    }
}
