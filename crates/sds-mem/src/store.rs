//! The in-memory array store that stands in for an on-disk file.
//!
//! A [`MemStore`] plays the role the format library's file plays for an
//! on-disk backend: it holds dimensions, attributes and row-major
//! variable data, and knows nothing about the generic metadata model.
//! Opening it through [`crate::open`] produces a bound
//! [`Dataset`](sds_core::Dataset) exactly the way the on-disk backends
//! produce one from their libraries.

use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::Pod;
use sds_core::SdsType;

/// Which backend family this store imitates. The flavor decides the
/// metadata policies applied when the store is opened: coordinate-flag
/// computation, dimension discovery and folding, reserved-attribute
/// filtering, compression reporting, and write support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// NetCDF-style: file-wide dimension list, at most one unlimited
    /// dimension, coordinate variables by name convention, writable.
    NetCdf,
    /// HDF4-style: per-dataset dimensions (several may be growable),
    /// backend-reported coordinate flags, read-only.
    Hdf4,
}

/// Compression recorded on a stored variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    None,
    /// Deflate with an effort level of 1-9.
    Deflate(u8),
    /// Any other method; reported to the model as level 1.
    Other,
}

/// An attribute as stored "on disk": text carries no NUL terminator,
/// matching the fixed-length character runs real files hold.
#[derive(Debug, Clone)]
pub struct MemAtt {
    pub name: String,
    pub ty: SdsType,
    pub count: usize,
    pub data: Vec<u8>,
}

impl MemAtt {
    /// A typed attribute; values are stored in native byte order.
    pub fn values<T: Pod>(name: impl Into<String>, ty: SdsType, values: &[T]) -> Self {
        let data: Vec<u8> = bytemuck::cast_slice(values).to_vec();
        assert_eq!(data.len(), values.len() * ty.size(), "element width mismatch");
        MemAtt {
            name: name.into(),
            ty,
            count: values.len(),
            data,
        }
    }

    /// A text attribute, stored without a terminator.
    pub fn text(name: impl Into<String>, value: &str) -> Self {
        MemAtt {
            name: name.into(),
            ty: SdsType::String,
            count: value.len(),
            data: value.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MemDim {
    pub name: String,
    pub size: usize,
    pub unlimited: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct MemVar {
    pub name: String,
    pub ty: SdsType,
    /// Store-level dimension ids, outermost first.
    pub dims: Vec<usize>,
    /// Backend-reported coordinate flag, honored by the HDF4-style
    /// flavor only; the NetCDF-style flavor derives the flag from the
    /// name convention instead.
    pub coordinate: bool,
    pub atts: Vec<MemAtt>,
    pub codec: Codec,
    /// Row-major element data.
    pub data: Vec<u8>,
}

/// An in-memory "file": the store every [`crate::MemBackend`] handle
/// reads from and writes to.
#[derive(Debug)]
pub struct MemStore {
    pub(crate) flavor: Flavor,
    /// Restrict variable types to the classic NetCDF profile.
    pub(crate) classic: bool,
    pub(crate) dims: Vec<MemDim>,
    pub(crate) gatts: Vec<MemAtt>,
    pub(crate) vars: Vec<MemVar>,
}

/// Shared handle to a store: one per "file", cloned into each open
/// backend. Single-threaded by design, like the rest of this layer.
pub type SharedStore = Rc<RefCell<MemStore>>;

impl MemStore {
    /// An empty NetCDF-style store with the enhanced type profile.
    pub fn netcdf() -> Self {
        MemStore {
            flavor: Flavor::NetCdf,
            classic: false,
            dims: Vec::new(),
            gatts: Vec::new(),
            vars: Vec::new(),
        }
    }

    /// An empty NetCDF-style store restricted to the classic profile:
    /// no unsigned-wide or 64-bit integer variables.
    pub fn netcdf_classic() -> Self {
        MemStore {
            classic: true,
            ..MemStore::netcdf()
        }
    }

    /// An empty HDF4-style store.
    pub fn hdf4() -> Self {
        MemStore {
            flavor: Flavor::Hdf4,
            classic: false,
            dims: Vec::new(),
            gatts: Vec::new(),
            vars: Vec::new(),
        }
    }

    /// Define a dimension, returning its store-level id.
    ///
    /// Panics when a second unlimited dimension is defined in a
    /// NetCDF-style store; the format allows only one.
    pub fn add_dim(&mut self, name: impl Into<String>, size: usize, unlimited: bool) -> usize {
        if unlimited && self.flavor == Flavor::NetCdf && self.dims.iter().any(|d| d.unlimited) {
            panic!("a NetCDF file allows only one unlimited dimension");
        }
        self.dims.push(MemDim {
            name: name.into(),
            size,
            unlimited,
        });
        self.dims.len() - 1
    }

    /// Attach a global attribute.
    pub fn add_global_att(&mut self, att: MemAtt) {
        self.gatts.push(att);
    }

    /// Define a variable over previously defined dimensions, returning
    /// its store-level id. `data` must hold exactly the variable's
    /// row-major elements for the dimensions' current sizes.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        ty: SdsType,
        dims: &[usize],
        data: Vec<u8>,
    ) -> usize {
        let name = name.into();
        if self.classic && !classic_profile_supports(ty) {
            panic!("variable '{name}' type {ty} is unsupported by the classic NetCDF profile");
        }
        let count: usize = dims.iter().map(|&d| self.dims[d].size).product();
        assert_eq!(
            data.len(),
            count * ty.size(),
            "variable '{name}' data length does not match its shape"
        );
        self.vars.push(MemVar {
            name,
            ty,
            dims: dims.to_vec(),
            coordinate: false,
            atts: Vec::new(),
            codec: Codec::None,
            data,
        });
        self.vars.len() - 1
    }

    /// Attach an attribute to a variable.
    pub fn add_var_att(&mut self, var: usize, att: MemAtt) {
        self.vars[var].atts.push(att);
    }

    /// Record the compression method of a variable.
    pub fn set_codec(&mut self, var: usize, codec: Codec) {
        self.vars[var].codec = codec;
    }

    /// Mark a variable as a coordinate, the way an HDF4-style library
    /// reports the flag itself.
    pub fn set_coordinate(&mut self, var: usize, coordinate: bool) {
        self.vars[var].coordinate = coordinate;
    }

    /// Wrap the finished store in the shared handle the open and create
    /// paths work with.
    pub fn into_shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }
}

/// Whether the classic NetCDF profile can represent a variable type.
pub(crate) fn classic_profile_supports(ty: SdsType) -> bool {
    matches!(
        ty,
        SdsType::I8
            | SdsType::I16
            | SdsType::I32
            | SdsType::F32
            | SdsType::F64
            | SdsType::String
    )
}
