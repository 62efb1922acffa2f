//! Decoding of the binary header at the start of every `.riv` file.
//!
//! The header consists of:
//!
//! - the 4-byte fingerprint `RIVE`,
//! - the major and minor format versions and the file id, each as LEB128 varuint,
//! - a table of contents listing the property keys used by the file, terminated by `0`,
//! - the backing field type of every listed property, 2 bits each, packed into
//!   little-endian `u32` words.

use thiserror::Error;

/// The major format version this crate understands.
pub const SUPPORTED_MAJOR_VERSION: u64 = 7;

const FINGERPRINT: &[u8; 4] = b"RIVE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("missing RIVE fingerprint")]
    MissingFingerprint,
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("varuint overflows 64 bits")]
    Overflow,
    #[error("unsupported major version {0} (expected {SUPPORTED_MAJOR_VERSION})")]
    UnsupportedVersion(u64),
}

/// The backing type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Uint,
    String,
    Double,
    Color,
}

impl FieldType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Uint,
            1 => Self::String,
            2 => Self::Double,
            _ => Self::Color,
        }
    }
}

/// The decoded header of a Rive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiveHeader {
    pub major_version: u64,
    pub minor_version: u64,
    pub file_id: u64,
    /// Properties listed in the table of contents, with their field types.
    pub properties: Vec<(u64, FieldType)>,
    /// The size of the header in bytes.
    pub len: usize,
}

impl RiveHeader {
    pub fn parse(data: &[u8]) -> Result<Self, HeaderError> {
        let mut reader = Reader { data, pos: 0 };

        if reader.take(FINGERPRINT.len())? != FINGERPRINT {
            return Err(HeaderError::MissingFingerprint);
        }

        let major_version = reader.varuint()?;
        if major_version != SUPPORTED_MAJOR_VERSION {
            return Err(HeaderError::UnsupportedVersion(major_version));
        }
        let minor_version = reader.varuint()?;
        let file_id = reader.varuint()?;

        let mut keys = Vec::new();
        loop {
            match reader.varuint()? {
                0 => break,
                key => keys.push(key),
            }
        }

        let mut properties = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(4) {
            let word = reader.u32()?;
            for (i, key) in chunk.iter().enumerate() {
                properties.push((*key, FieldType::from_bits(word >> (i * 2))));
            }
        }

        Ok(Self {
            major_version,
            minor_version,
            file_id,
            properties,
            len: reader.pos,
        })
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], HeaderError> {
        let end = self.pos.checked_add(n).ok_or(HeaderError::UnexpectedEof)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(HeaderError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn varuint(&mut self) -> Result<u64, HeaderError> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.take(1)?[0];
            if shift >= 64 || (shift == 63 && byte & 0x7f > 1) {
                return Err(HeaderError::Overflow);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn u32(&mut self) -> Result<u32, HeaderError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_header() {
        let data = b"RIVE\x07\x00\x2a\x00";
        let header = RiveHeader::parse(data).unwrap();
        assert_eq!(header.major_version, 7);
        assert_eq!(header.minor_version, 0);
        assert_eq!(header.file_id, 42);
        assert!(header.properties.is_empty());
        assert_eq!(header.len, data.len());
    }

    #[test]
    fn test_multibyte_varuint() {
        // file id 300 = 0b1_0010_1100
        let data = b"RIVE\x07\x01\xac\x02\x00trailing";
        let header = RiveHeader::parse(data).unwrap();
        assert_eq!(header.minor_version, 1);
        assert_eq!(header.file_id, 300);
        assert_eq!(header.len, 9);
    }

    #[test]
    fn test_table_of_contents() {
        let mut data = b"RIVE\x07\x00\x01".to_vec();
        // five property keys, terminated by 0
        data.extend_from_slice(&[10, 11, 12, 13, 14, 0]);
        // types for keys 10..=13: uint, string, double, color
        data.extend_from_slice(&0b11_10_01_00u32.to_le_bytes());
        // type for key 14: string
        data.extend_from_slice(&0b01u32.to_le_bytes());

        let header = RiveHeader::parse(&data).unwrap();
        assert_eq!(
            header.properties,
            vec![
                (10, FieldType::Uint),
                (11, FieldType::String),
                (12, FieldType::Double),
                (13, FieldType::Color),
                (14, FieldType::String),
            ]
        );
        assert_eq!(header.len, data.len());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            RiveHeader::parse(b"RIFF\x07\x00\x00\x00"),
            Err(HeaderError::MissingFingerprint)
        );
        assert_eq!(RiveHeader::parse(b"RIV"), Err(HeaderError::UnexpectedEof));
        assert_eq!(
            RiveHeader::parse(b"RIVE\x06\x00\x00\x00"),
            Err(HeaderError::UnsupportedVersion(6))
        );
        // missing table of contents terminator
        assert_eq!(
            RiveHeader::parse(b"RIVE\x07\x00\x00\x05"),
            Err(HeaderError::UnexpectedEof)
        );
        // key listed, but its field types are missing
        assert_eq!(
            RiveHeader::parse(b"RIVE\x07\x00\x00\x05\x00\x01"),
            Err(HeaderError::UnexpectedEof)
        );
        assert_eq!(
            RiveHeader::parse(b"RIVE\x07\x00\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\x01"),
            Err(HeaderError::Overflow)
        );
    }
}
