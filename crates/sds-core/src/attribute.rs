//! Named, typed auxiliary values attached to a dataset or a variable.

use bytemuck::Pod;

use crate::types::SdsType;

/// A small named value attached to a [`Dataset`](crate::Dataset) (global
/// attribute) or to a [`Variable`](crate::Variable).
///
/// The attribute owns `count * ty.size()` raw bytes, interpreted
/// according to `ty`. For [`SdsType::String`] attributes the count
/// includes a terminating NUL byte: backends that store fixed-length
/// character runs without a terminator append one on read.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    ty: SdsType,
    count: usize,
    data: Vec<u8>,
}

impl Attribute {
    /// Create an attribute from raw bytes. The data is copied.
    ///
    /// Panics if `data` is not exactly `count * ty.size()` bytes long;
    /// a mismatched length is a programming error, not a file error.
    pub fn new(name: impl Into<String>, ty: SdsType, count: usize, data: &[u8]) -> Self {
        assert_eq!(
            data.len(),
            count * ty.size(),
            "attribute data length does not match count * element width"
        );
        Attribute {
            name: name.into(),
            ty,
            count,
            data: data.to_vec(),
        }
    }

    /// Create an attribute from a slice of typed values. The values are
    /// copied byte-for-byte in native byte order.
    pub fn from_values<T: Pod>(name: impl Into<String>, ty: SdsType, values: &[T]) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        Self::new(name, ty, values.len(), bytes)
    }

    /// Create a text attribute. The stored count includes the
    /// terminating NUL, matching what backends produce on read.
    pub fn text(name: impl Into<String>, value: &str) -> Self {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        Attribute {
            name: name.into(),
            ty: SdsType::String,
            count: data.len(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sds_type(&self) -> SdsType {
        self.ty
    }

    /// Number of elements, including the NUL terminator for text.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Total owned byte length (`count * element width`).
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// The raw attribute bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode the attribute as a vector of typed values.
    ///
    /// The bytes are copied out rather than reinterpreted in place, so
    /// the one-byte alignment of the owned buffer is never a concern.
    pub fn values<T: Pod>(&self) -> Vec<T> {
        bytemuck::pod_collect_to_vec(&self.data)
    }

    /// The text of a string attribute with the trailing NUL (and any
    /// padding NULs) trimmed, or `None` for non-string attributes or
    /// non-UTF-8 content.
    pub fn as_str(&self) -> Option<&str> {
        if self.ty != SdsType::String {
            return None;
        }
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        std::str::from_utf8(&self.data[..end]).ok()
    }
}
