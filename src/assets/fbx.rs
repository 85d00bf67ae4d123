//! Binary FBX reader
//!
//! Parses the Kaydara binary container into a plain node tree. Only the
//! container is understood here; scene semantics live in `scene`.
//!
//! Layout:
//! - 27-byte header: magic, `0x1A 0x00`, little-endian u32 version
//! - node records: end offset, property count, property list length
//!   (u32 before 7500, u64 from 7500), name length (u8), name
//! - properties, then nested records terminated by an all-zero record

use std::io::Read;

use flate2::read::ZlibDecoder;
use thiserror::Error;

const MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";
const HEADER_LEN: usize = 27;
/// First version using 64-bit record offsets
const WIDE_OFFSET_VERSION: u32 = 7500;
/// Deepest record nesting accepted
const MAX_NODE_DEPTH: usize = 128;
/// Upper bound of deflate's compression ratio
const MAX_INFLATE_RATIO: usize = 1032;

#[derive(Error, Debug)]
pub enum FbxError {
    #[error("not a binary FBX file")]
    NotBinaryFbx,

    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(usize),

    #[error("unknown property type {code:?} at offset {offset}")]
    UnknownPropertyType { code: char, offset: usize },

    #[error("failed to inflate array: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("node name at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("malformed node at offset {offset}: {reason}")]
    MalformedNode { offset: usize, reason: &'static str },
}

/// A single node property
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    I64Array(Vec<i64>),
    I32Array(Vec<i32>),
    BoolArray(Vec<bool>),
    String(String),
    Raw(Vec<u8>),
}

impl Property {
    /// Any scalar number as f64
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Property::I16(v) => Some(v as f64),
            Property::I32(v) => Some(v as f64),
            Property::I64(v) => Some(v as f64),
            Property::F32(v) => Some(v as f64),
            Property::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Integer scalar (object ids are i64)
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Property::I16(v) => Some(v as i64),
            Property::I32(v) => Some(v as i64),
            Property::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric array widened to f64
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Property::F64Array(v) => Some(v.clone()),
            Property::F32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Property::I32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Property::I64Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FbxNode {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    pub fn new(name: impl Into<String>, properties: Vec<Property>, children: Vec<FbxNode>) -> Self {
        Self {
            name: name.into(),
            properties,
            children,
        }
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FbxNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn prop(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FbxDocument {
    pub version: u32,
    pub nodes: Vec<FbxNode>,
}

impl FbxDocument {
    /// Top-level node by name
    pub fn find(&self, name: &str) -> Option<&FbxNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Cheap check used before attempting a full parse
pub fn is_binary_fbx(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && bytes.starts_with(MAGIC)
}

/// Parse a binary FBX file
pub fn parse(bytes: &[u8]) -> Result<FbxDocument, FbxError> {
    if !is_binary_fbx(bytes) {
        return Err(FbxError::NotBinaryFbx);
    }
    let mut reader = Reader {
        bytes,
        pos: MAGIC.len() + 2,
        wide: false,
    };
    let version = reader.u32()?;
    reader.wide = version >= WIDE_OFFSET_VERSION;

    let mut nodes = Vec::new();
    // The footer follows the top-level null record; a truncated file may
    // omit it, so stop once a full record header no longer fits.
    while reader.remaining() >= reader.record_header_len() {
        match reader.node(0)? {
            Some(node) => nodes.push(node),
            None => break,
        }
    }
    log::debug!("Parsed FBX {} with {} top-level nodes", version, nodes.len());
    Ok(FbxDocument { version, nodes })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    wide: bool,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn record_header_len(&self) -> usize {
        if self.wide { 25 } else { 13 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FbxError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(FbxError::UnexpectedEof(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FbxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, FbxError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, FbxError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Record offset/count field, width depending on version
    fn offset(&mut self) -> Result<u64, FbxError> {
        if self.wide {
            Ok(u64::from_le_bytes(self.array()?))
        } else {
            Ok(self.u32()? as u64)
        }
    }

    fn node(&mut self, depth: usize) -> Result<Option<FbxNode>, FbxError> {
        let start = self.pos;
        if depth > MAX_NODE_DEPTH {
            return Err(FbxError::MalformedNode {
                offset: start,
                reason: "nesting too deep",
            });
        }
        let end_offset = self.offset()?;
        let num_props = self.offset()?;
        let _prop_list_len = self.offset()?;
        let name_len = self.u8()? as usize;

        if end_offset == 0 {
            if num_props != 0 || name_len != 0 {
                return Err(FbxError::MalformedNode {
                    offset: start,
                    reason: "null record with content",
                });
            }
            return Ok(None);
        }

        let end = usize::try_from(end_offset).map_err(|_| FbxError::UnexpectedEof(start))?;
        if end > self.bytes.len() {
            return Err(FbxError::UnexpectedEof(start));
        }

        let name_at = self.pos;
        let name = std::str::from_utf8(self.take(name_len)?)
            .map_err(|_| FbxError::InvalidUtf8(name_at))?
            .to_string();

        let mut properties = Vec::new();
        for _ in 0..num_props {
            properties.push(self.property()?);
        }

        let mut children = Vec::new();
        while self.pos < end {
            match self.node(depth + 1)? {
                Some(child) => children.push(child),
                None => break,
            }
        }

        if self.pos > end {
            return Err(FbxError::MalformedNode {
                offset: start,
                reason: "content overruns end offset",
            });
        }
        self.pos = end;

        Ok(Some(FbxNode {
            name,
            properties,
            children,
        }))
    }

    fn property(&mut self) -> Result<Property, FbxError> {
        let offset = self.pos;
        let code = self.u8()?;
        let prop = match code {
            b'Y' => Property::I16(i16::from_le_bytes(self.array()?)),
            b'C' => Property::Bool(self.u8()? != 0),
            b'I' => Property::I32(i32::from_le_bytes(self.array()?)),
            b'F' => Property::F32(f32::from_le_bytes(self.array()?)),
            b'D' => Property::F64(f64::from_le_bytes(self.array()?)),
            b'L' => Property::I64(i64::from_le_bytes(self.array()?)),
            b'f' => Property::F32Array(self.array_values(4, |b| f32::from_le_bytes(chunk(b)))?),
            b'd' => Property::F64Array(self.array_values(8, |b| f64::from_le_bytes(chunk(b)))?),
            b'l' => Property::I64Array(self.array_values(8, |b| i64::from_le_bytes(chunk(b)))?),
            b'i' => Property::I32Array(self.array_values(4, |b| i32::from_le_bytes(chunk(b)))?),
            b'b' => Property::BoolArray(self.array_values(1, |b| b[0] != 0)?),
            b'S' => {
                let len = self.u32()? as usize;
                Property::String(String::from_utf8_lossy(self.take(len)?).into_owned())
            }
            b'R' => {
                let len = self.u32()? as usize;
                Property::Raw(self.take(len)?.to_vec())
            }
            other => {
                return Err(FbxError::UnknownPropertyType {
                    code: other as char,
                    offset,
                });
            }
        };
        Ok(prop)
    }

    fn array_values<T>(&mut self, elem_size: usize, decode: impl Fn(&[u8]) -> T) -> Result<Vec<T>, FbxError> {
        let start = self.pos;
        let len = self.u32()? as usize;
        let encoding = self.u32()?;
        let stored_len = self.u32()? as usize;
        let stored = self.take(stored_len)?;
        let expected = len.checked_mul(elem_size).ok_or(FbxError::MalformedNode {
            offset: start,
            reason: "array length overflow",
        })?;

        let raw: Vec<u8> = match encoding {
            0 => stored.to_vec(),
            1 => {
                if expected > stored_len.saturating_mul(MAX_INFLATE_RATIO) {
                    return Err(FbxError::MalformedNode {
                        offset: start,
                        reason: "array length exceeds compressed data",
                    });
                }
                // One byte over so oversized streams fail the size check
                let mut out = Vec::new();
                ZlibDecoder::new(stored)
                    .take(expected as u64 + 1)
                    .read_to_end(&mut out)?;
                out
            }
            _ => {
                return Err(FbxError::MalformedNode {
                    offset: start,
                    reason: "unknown array encoding",
                });
            }
        };

        if raw.len() != expected {
            return Err(FbxError::MalformedNode {
                offset: start,
                reason: "array size mismatch",
            });
        }
        Ok(raw.chunks_exact(elem_size).map(decode).collect())
    }
}

fn chunk<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Minimal binary FBX writer for building parser fixtures
#[cfg(test)]
pub(crate) mod writer {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::{FbxNode, MAGIC, Property, WIDE_OFFSET_VERSION};

    pub(crate) fn write_document(version: u32, nodes: &[FbxNode], compress: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[0x1A, 0x00]);
        out.extend_from_slice(&version.to_le_bytes());
        let wide = version >= WIDE_OFFSET_VERSION;
        for node in nodes {
            write_node(&mut out, node, wide, compress);
        }
        write_null(&mut out, wide);
        // Footer padding; the reader ignores it
        out.extend_from_slice(&[0u8; 16]);
        out
    }

    fn put_offset(out: &mut Vec<u8>, value: u64, wide: bool) {
        if wide {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
    }

    fn patch_offset(out: &mut [u8], at: usize, value: u64, wide: bool) {
        if wide {
            out[at..at + 8].copy_from_slice(&value.to_le_bytes());
        } else {
            out[at..at + 4].copy_from_slice(&(value as u32).to_le_bytes());
        }
    }

    fn write_null(out: &mut Vec<u8>, wide: bool) {
        let len = if wide { 25 } else { 13 };
        out.extend(std::iter::repeat_n(0u8, len));
    }

    fn write_node(out: &mut Vec<u8>, node: &FbxNode, wide: bool, compress: bool) {
        let width = if wide { 8 } else { 4 };
        let start = out.len();
        put_offset(out, 0, wide);
        put_offset(out, node.properties.len() as u64, wide);
        put_offset(out, 0, wide);
        out.push(node.name.len() as u8);
        out.extend_from_slice(node.name.as_bytes());

        let props_start = out.len();
        for prop in &node.properties {
            write_property(out, prop, compress);
        }
        let props_len = (out.len() - props_start) as u64;

        if !node.children.is_empty() {
            for child in &node.children {
                write_node(out, child, wide, compress);
            }
            write_null(out, wide);
        }

        let end = out.len() as u64;
        patch_offset(out, start, end, wide);
        patch_offset(out, start + 2 * width, props_len, wide);
    }

    fn write_array(out: &mut Vec<u8>, code: u8, count: usize, raw: Vec<u8>, compress: bool) {
        out.push(code);
        out.extend_from_slice(&(count as u32).to_le_bytes());
        let (encoding, stored) = if compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw).unwrap();
            (1u32, encoder.finish().unwrap())
        } else {
            (0u32, raw)
        };
        out.extend_from_slice(&encoding.to_le_bytes());
        out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        out.extend_from_slice(&stored);
    }

    fn write_property(out: &mut Vec<u8>, prop: &Property, compress: bool) {
        match prop {
            Property::I16(v) => {
                out.push(b'Y');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Property::Bool(v) => {
                out.push(b'C');
                out.push(*v as u8);
            }
            Property::I32(v) => {
                out.push(b'I');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Property::F32(v) => {
                out.push(b'F');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Property::F64(v) => {
                out.push(b'D');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Property::I64(v) => {
                out.push(b'L');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Property::F32Array(v) => {
                let raw = v.iter().flat_map(|x| x.to_le_bytes()).collect();
                write_array(out, b'f', v.len(), raw, compress);
            }
            Property::F64Array(v) => {
                let raw = v.iter().flat_map(|x| x.to_le_bytes()).collect();
                write_array(out, b'd', v.len(), raw, compress);
            }
            Property::I64Array(v) => {
                let raw = v.iter().flat_map(|x| x.to_le_bytes()).collect();
                write_array(out, b'l', v.len(), raw, compress);
            }
            Property::I32Array(v) => {
                let raw = v.iter().flat_map(|x| x.to_le_bytes()).collect();
                write_array(out, b'i', v.len(), raw, compress);
            }
            Property::BoolArray(v) => {
                let raw = v.iter().map(|&b| b as u8).collect();
                write_array(out, b'b', v.len(), raw, compress);
            }
            Property::String(s) => {
                out.push(b'S');
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Property::Raw(bytes) => {
                out.push(b'R');
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::writer::write_document;
    use super::*;

    fn sample_tree() -> Vec<FbxNode> {
        vec![
            FbxNode::new(
                "FBXHeaderExtension",
                vec![],
                vec![FbxNode::new("FBXVersion", vec![Property::I32(7400)], vec![])],
            ),
            FbxNode::new(
                "Objects",
                vec![],
                vec![FbxNode::new(
                    "Geometry",
                    vec![
                        Property::I64(1001),
                        Property::String("Cube\0\x01Geometry".into()),
                        Property::String("Mesh".into()),
                    ],
                    vec![
                        FbxNode::new(
                            "Vertices",
                            vec![Property::F64Array(vec![-1.0, 0.0, 0.5, 1.0, 2.0, -0.5])],
                            vec![],
                        ),
                        FbxNode::new(
                            "PolygonVertexIndex",
                            vec![Property::I32Array(vec![0, 1, -3])],
                            vec![],
                        ),
                        FbxNode::new(
                            "Flags",
                            vec![
                                Property::I16(-2),
                                Property::Bool(true),
                                Property::F32(0.25),
                                Property::F64(1.5),
                                Property::I64Array(vec![7, 8]),
                                Property::F32Array(vec![0.5]),
                                Property::BoolArray(vec![true, false]),
                                Property::Raw(vec![1, 2, 3]),
                            ],
                            vec![],
                        ),
                    ],
                )],
            ),
        ]
    }

    #[test]
    fn test_parses_legacy_offsets() {
        let bytes = write_document(7400, &sample_tree(), false);
        let doc = parse(&bytes).unwrap();
        assert_eq!(doc.version, 7400);
        assert_eq!(doc.nodes, sample_tree());
    }

    #[test]
    fn test_parses_wide_offsets_and_zlib_arrays() {
        let bytes = write_document(7500, &sample_tree(), true);
        let doc = parse(&bytes).unwrap();
        assert_eq!(doc.version, 7500);
        assert_eq!(doc.nodes, sample_tree());

        let geometry = doc.find("Objects").and_then(|o| o.child("Geometry")).unwrap();
        assert_eq!(geometry.prop(0).and_then(Property::as_i64), Some(1001));
        let vertices = geometry
            .child("Vertices")
            .and_then(|v| v.prop(0))
            .and_then(Property::to_f64_vec)
            .unwrap();
        assert_eq!(vertices.len(), 6);
    }

    #[test]
    fn test_rejects_ascii_fbx() {
        let ascii = b"; FBX 7.4.0 project file\nFBXHeaderExtension:  {\n}\n";
        assert!(matches!(parse(ascii), Err(FbxError::NotBinaryFbx)));
        assert!(matches!(parse(b""), Err(FbxError::NotBinaryFbx)));
    }

    #[test]
    fn test_truncated_file_errors() {
        let bytes = write_document(7400, &sample_tree(), false);
        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(parse(cut), Err(FbxError::UnexpectedEof(_))));
    }

    #[test]
    fn test_unknown_property_code() {
        let mut bytes = write_document(
            7400,
            &[FbxNode::new("Odd", vec![Property::I32(5)], vec![])],
            false,
        );
        // Header (27) + record header (13) + name (3) puts the type code here
        let code_at = 27 + 13 + 3;
        assert_eq!(bytes[code_at], b'I');
        bytes[code_at] = b'Q';
        assert!(matches!(
            parse(&bytes),
            Err(FbxError::UnknownPropertyType { code: 'Q', .. })
        ));
    }

    fn single_array_document(values: Vec<f64>) -> Vec<u8> {
        write_document(
            7400,
            &[FbxNode::new("Big", vec![Property::F64Array(values)], vec![])],
            true,
        )
    }

    #[test]
    fn test_huge_declared_array_is_rejected() {
        let mut bytes = single_array_document(vec![1.0]);
        // Header (27) + record header (13) + name (3) + type code (1)
        let len_at = 27 + 13 + 3 + 1;
        assert_eq!(bytes[len_at - 1], b'd');
        bytes[len_at..len_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(FbxError::MalformedNode { reason: "array length exceeds compressed data", .. })
        ));
    }

    #[test]
    fn test_oversized_inflate_stops_at_declared_length() {
        let mut bytes = single_array_document(vec![0.0; 4096]);
        let len_at = 27 + 13 + 3 + 1;
        bytes[len_at..len_at + 4].copy_from_slice(&10u32.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(FbxError::MalformedNode { reason: "array size mismatch", .. })
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut node = FbxNode::new("N", vec![], vec![]);
        for _ in 0..(MAX_NODE_DEPTH + 10) {
            node = FbxNode::new("N", vec![], vec![node]);
        }
        let bytes = write_document(7400, &[node], false);
        assert!(matches!(
            parse(&bytes),
            Err(FbxError::MalformedNode { reason: "nesting too deep", .. })
        ));

        let mut shallow = FbxNode::new("N", vec![], vec![]);
        for _ in 0..(MAX_NODE_DEPTH - 1) {
            shallow = FbxNode::new("N", vec![], vec![shallow]);
        }
        let bytes = write_document(7400, &[shallow], false);
        assert!(parse(&bytes).is_ok());
    }

    #[test]
    fn test_property_accessors() {
        assert_eq!(Property::F32(0.5).as_f64(), Some(0.5));
        assert_eq!(Property::I16(3).as_i64(), Some(3));
        assert_eq!(Property::String("x".into()).as_f64(), None);
        assert_eq!(Property::String("x".into()).as_str(), Some("x"));
        assert_eq!(Property::I32Array(vec![1, 2]).to_f64_vec(), Some(vec![1.0, 2.0]));
    }
}
