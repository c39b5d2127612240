//! Trail file header structure.

use zerocopy::byteorder::{LittleEndian, I32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Trail file header.
///
/// This structure occupies the first 8 bytes of every `.trl` file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct TrlHeader {
    /// Format version (only `0` is supported).
    version: I32<LittleEndian>,
    /// Map the trail is placed on.
    map_id: I32<LittleEndian>,
}

impl TrlHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// The only format version this reader understands.
    pub const SUPPORTED_VERSION: i32 = 0;

    /// Create a header for a supported trail file.
    pub fn new(map_id: i32) -> Self {
        Self {
            version: I32::new(Self::SUPPORTED_VERSION),
            map_id: I32::new(map_id),
        }
    }

    /// Read the header from the start of `data` without looking at points.
    ///
    /// Returns `None` if `data` is shorter than the header.
    pub fn peek(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(header, _)| header)
    }

    /// Format version.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version.get()
    }

    /// Map the trail is placed on.
    #[inline]
    pub fn map_id(&self) -> i32 {
        self.map_id.get()
    }

    /// Check whether the points following this header can be read.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.version() == Self::SUPPORTED_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<TrlHeader>(), TrlHeader::SIZE);
    }

    #[test]
    fn test_peek() {
        let data = [0, 0, 0, 0, 0x0f, 0x04, 0, 0, 0xff];
        let header = TrlHeader::peek(&data).unwrap();
        assert_eq!(header.version(), 0);
        assert_eq!(header.map_id(), 0x040f);
        assert!(header.is_supported());
    }

    #[test]
    fn test_peek_short_input() {
        assert!(TrlHeader::peek(&[0, 0, 0, 0, 5, 0, 0]).is_none());
        assert!(TrlHeader::peek(&[]).is_none());
    }

    #[test]
    fn test_new_round_trips_through_bytes() {
        let header = TrlHeader::new(-7);
        let parsed = TrlHeader::peek(header.as_bytes()).unwrap();
        assert_eq!(parsed.map_id(), -7);
        assert!(parsed.is_supported());
    }
}
