//! Named, typed multi-dimensional arrays.

use crate::attribute::Attribute;
use crate::types::SdsType;

/// A named, typed array whose shape is given by an ordered list of
/// dimension references, outermost first.
///
/// Dimension references are indices into the owning
/// [`Dataset`](crate::Dataset)'s dimension list; the variable never owns
/// its dimensions. Read and write calls are methods on the dataset, so
/// no back-reference from variable to dataset is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Name, unique within the owning dataset.
    pub name: String,
    pub ty: SdsType,
    /// True when this variable's name matches a dimension name (the
    /// NetCDF "coordinate variable" convention) or when the backend
    /// reports it as a coordinate directly.
    pub coordinate: bool,
    /// Indices into the owning dataset's dimension list, outermost
    /// (slowest-varying) first. Empty for a scalar.
    pub dims: Vec<usize>,
    pub atts: Vec<Attribute>,
    /// Backend-private identifier; `None` when unbound.
    pub id: Option<i32>,
    /// Compression effort recorded in the file: 0 for none, 1-9 for
    /// deflate levels, 1 for any other backend codec.
    pub compress: u8,
}

impl Variable {
    /// A fresh, unbound, uncompressed variable.
    pub fn new(
        name: impl Into<String>,
        ty: SdsType,
        coordinate: bool,
        atts: Vec<Attribute>,
        dims: Vec<usize>,
    ) -> Self {
        Variable {
            name: name.into(),
            ty,
            coordinate,
            dims,
            atts,
            id: None,
            compress: 0,
        }
    }

    /// Number of axes.
    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    /// Look up an attribute of this variable by name.
    pub fn att(&self, name: &str) -> Option<&Attribute> {
        self.atts.iter().find(|a| a.name() == name)
    }
}
