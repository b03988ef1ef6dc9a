//! Format-agnostic metadata model and buffered strided I/O for
//! scientific data sets.
//!
//! Heterogeneous array-file formats (the NetCDF family's self-describing
//! array format, the HDF4 family's multi-dataset format) expose one
//! uniform surface here: typed [`Attribute`]s, named [`Dimension`]s
//! (including an unlimited, growable one), multi-dimensional
//! [`Variable`]s, and windowed reads and writes through a reusable
//! [`IoBuffer`]. Concrete backends implement the [`Backend`] contract
//! and bind themselves to the [`Dataset`] they populate; everything
//! above that contract is backend-independent.
//!
//! # Reading
//!
//! ```no_run
//! # fn open_somehow() -> sds_core::Dataset { unimplemented!() }
//! use sds_core::IoBuffer;
//!
//! let mut ds = open_somehow();
//! let vi = ds.var_index("temperature").unwrap();
//! let mut buf = IoBuffer::new();
//! for step in 0..ds.unlimited_dim().map_or(1, |d| d.size) {
//!     let slab = ds.read_timestep(vi, &mut buf, step);
//!     // one full timestep of raw bytes, reusing one allocation
//!     let _ = slab;
//! }
//! ds.close();
//! ```
//!
//! # Error policy
//!
//! Backend I/O failures are fatal at this layer: the engine panics with
//! a diagnostic naming the file and the format library's error string.
//! This is deliberate; the layer offers no recovery path for corrupt or
//! inaccessible files, and callers needing resilience wrap it from
//! outside. Name lookups, by contrast, miss softly with `None`, and
//! [`open_any`] reports an unrecognized file as `None` rather than an
//! error.

pub mod attribute;
pub mod backend;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod io;
pub mod magic;
pub mod sort;
pub mod types;
pub mod variable;

pub use attribute::Attribute;
pub use backend::{Backend, BufferSlot, WindowReq};
pub use dataset::{copy_vars, Dataset};
pub use dimension::Dimension;
pub use error::SdsError;
pub use io::{IoBuffer, Sel};
pub use magic::{open_any, FileKind};
pub use sort::{sort_attributes, sort_variables};
pub use types::SdsType;
pub use variable::Variable;
