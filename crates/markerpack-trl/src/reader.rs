//! Section reader for trail files.

use std::iter::FusedIterator;
use std::slice::ChunksExact;

use byteorder::{ByteOrder, LittleEndian};

use crate::{Point3, TrailSection, TrlHeader};

/// Size of one on-disk point triple.
const POINT_SIZE: usize = 12;

/// Read the map ID of a supported trail file without reading any points.
pub fn peek_map_id(data: &[u8]) -> Option<i32> {
    TrlHeader::peek(data)
        .filter(TrlHeader::is_supported)
        .map(|h| h.map_id())
}

/// A trail file borrowed from a byte buffer.
///
/// Parsing is lazy: [`TrlFile::sections`] walks the point data on demand and
/// can be called any number of times.
#[derive(Debug, Clone, Copy)]
pub struct TrlFile<'a> {
    header: Option<TrlHeader>,
    body: &'a [u8],
}

impl<'a> TrlFile<'a> {
    /// Wrap trail file bytes.
    pub fn new(data: &'a [u8]) -> Self {
        let header = TrlHeader::peek(data);
        let body: &'a [u8] = match header {
            Some(h) if h.is_supported() => &data[TrlHeader::SIZE..],
            _ => &[],
        };

        Self { header, body }
    }

    /// The header, if the input was long enough to contain one.
    #[inline]
    pub fn header(&self) -> Option<&TrlHeader> {
        self.header.as_ref()
    }

    /// Map ID of a supported file.
    pub fn map_id(&self) -> Option<i32> {
        self.header
            .filter(TrlHeader::is_supported)
            .map(|h| h.map_id())
    }

    /// Check whether the file has a header with a supported version.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.map_id().is_some()
    }

    /// Iterate over the sections of the trail.
    ///
    /// Unsupported or truncated files yield nothing.
    pub fn sections(&self) -> Sections<'a> {
        Sections {
            map_id: self.map_id().unwrap_or_default(),
            chunks: self.body.chunks_exact(POINT_SIZE),
        }
    }

    /// Read every section into a vector.
    pub fn read_sections(data: &'a [u8]) -> Vec<TrailSection> {
        Self::new(data).sections().collect()
    }
}

/// Iterator over the sections of a trail file.
///
/// Every `(0, 0, 0)` terminator ends a section, so consecutive terminators
/// yield empty sections. A trailing run without a terminator is still
/// yielded if it has points, and a trailing partial triple is ignored.
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    map_id: i32,
    chunks: ChunksExact<'a, u8>,
}

impl Iterator for Sections<'_> {
    type Item = TrailSection;

    fn next(&mut self) -> Option<Self::Item> {
        let mut points = Vec::new();

        for chunk in self.chunks.by_ref() {
            // Stored as (x, z, y).
            let x = LittleEndian::read_f32(&chunk[0..4]);
            let z = LittleEndian::read_f32(&chunk[4..8]);
            let y = LittleEndian::read_f32(&chunk[8..12]);
            let point = Point3::new(x, y, z);

            if point.is_origin() {
                return Some(TrailSection::new(self.map_id, points));
            }

            points.push(point);
        }

        (!points.is_empty()).then(|| TrailSection::new(self.map_id, points))
    }
}

impl FusedIterator for Sections<'_> {}

/// Encode sections as a version 0 trail file.
///
/// Every section is followed by a terminator. Section map IDs are ignored in
/// favour of `map_id` since the format stores a single map per file.
pub fn encode(map_id: i32, sections: &[TrailSection]) -> Vec<u8> {
    let point_count: usize = sections.iter().map(|s| s.points().len() + 1).sum();
    let mut out = Vec::with_capacity(TrlHeader::SIZE + point_count * POINT_SIZE);

    out.extend_from_slice(zerocopy::IntoBytes::as_bytes(&TrlHeader::new(map_id)));

    for section in sections {
        let terminator = Point3::default();
        for point in section.points().iter().chain(std::iter::once(&terminator)) {
            let mut triple = [0u8; POINT_SIZE];
            LittleEndian::write_f32(&mut triple[0..4], point.x);
            LittleEndian::write_f32(&mut triple[4..8], point.z);
            LittleEndian::write_f32(&mut triple[8..12], point.y);
            out.extend_from_slice(&triple);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(version: i32, map_id: i32, triples: &[[f32; 3]]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&version.to_le_bytes());
        data.extend_from_slice(&map_id.to_le_bytes());
        for t in triples {
            for v in t {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        data
    }

    #[test]
    fn test_sections_split_on_terminator() {
        let data = raw(
            0,
            5,
            &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
        );

        let sections = TrlFile::read_sections(&data);
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0],
            TrailSection::new(5, vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)])
        );
        assert_eq!(sections[1], TrailSection::new(5, vec![Point3::new(3.0, 0.0, 0.0)]));
    }

    #[test]
    fn test_axes_are_remapped() {
        let data = raw(0, 1, &[[1.0, 2.0, 3.0]]);
        let sections = TrlFile::read_sections(&data);
        assert_eq!(sections[0].points(), &[Point3::new(1.0, 3.0, 2.0)]);
    }

    #[test]
    fn test_unsupported_version_yields_nothing() {
        let data = raw(1, 5, &[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [3.0, 0.0, 0.0]]);
        let file = TrlFile::new(&data);

        assert_eq!(file.sections().count(), 0);
        assert_eq!(file.map_id(), None);
        assert_eq!(file.header().map(|h| h.version()), Some(1));
        assert_eq!(peek_map_id(&data), None);
    }

    #[test]
    fn test_short_input_yields_nothing() {
        assert_eq!(TrlFile::new(&[0, 0, 0, 0, 5]).sections().count(), 0);
        assert_eq!(TrlFile::new(&[]).sections().count(), 0);
        assert!(TrlFile::new(&[]).header().is_none());
    }

    #[test]
    fn test_header_only() {
        let data = raw(0, 9, &[]);
        assert_eq!(peek_map_id(&data), Some(9));
        assert_eq!(TrlFile::new(&data).sections().count(), 0);
    }

    #[test]
    fn test_sections_are_restartable() {
        let data = raw(0, 2, &[[1.0, 1.0, 1.0], [0.0, 0.0, 0.0], [2.0, 2.0, 2.0]]);
        let file = TrlFile::new(&data);

        let first: Vec<_> = file.sections().collect();
        let second: Vec<_> = file.sections().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_every_terminator_ends_a_section() {
        let data = raw(
            0,
            3,
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
            ],
        );
        let sections = TrlFile::read_sections(&data);

        let lengths: Vec<_> = sections.iter().map(|s| s.points().len()).collect();
        assert_eq!(lengths, vec![0, 1, 0, 1]);
        assert!(sections.iter().all(|s| s.map_id() == 3));
    }

    #[test]
    fn test_trailing_terminator_adds_no_section() {
        let data = raw(0, 3, &[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        assert_eq!(TrlFile::read_sections(&data).len(), 1);
    }

    #[test]
    fn test_partial_trailing_triple_is_ignored() {
        let mut data = raw(0, 3, &[[4.0, 5.0, 6.0]]);
        data.extend_from_slice(&[1, 2, 3, 4, 5]);

        let sections = TrlFile::read_sections(&data);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].points(), &[Point3::new(4.0, 6.0, 5.0)]);
    }

    #[test]
    fn test_encode_matches_reader() {
        let sections = vec![
            TrailSection::new(12, vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)]),
            TrailSection::new(12, vec![Point3::new(-1.0, 0.5, 8.0)]),
        ];

        let data = encode(12, &sections);
        assert_eq!(data.len(), 8 + 5 * 12);
        assert_eq!(TrlFile::read_sections(&data), sections);

        let with_gap = vec![TrailSection::new(12, Vec::new()), sections[1].clone()];
        assert_eq!(TrlFile::read_sections(&encode(12, &with_gap)), with_gap);
    }
}
