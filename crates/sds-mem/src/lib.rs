//! In-memory reference backend for the SDS layer.
//!
//! The on-disk format libraries this layer abstracts over are external
//! collaborators; this crate supplies the one backend that ships with
//! the workspace: a shared in-memory array store with a NetCDF-style
//! and an HDF4-style personality. It implements every policy the
//! backend contract asks of those families (dimension discovery and
//! de-duplication, fake-dimension folding, coordinate-flag rules,
//! reserved-attribute filtering, compression reporting, and the
//! write-support asymmetry) and so doubles as the test bed for the
//! whole engine.
//!
//! # Example
//!
//! ```
//! use sds_core::{IoBuffer, SdsType};
//! use sds_mem::{open, MemStore};
//!
//! let mut store = MemStore::netcdf();
//! let t = store.add_dim("t", 2, true);
//! let x = store.add_dim("x", 3, false);
//! let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
//! store.add_var("temp", SdsType::F32, &[t, x], bytemuck::cast_slice(&data).to_vec());
//! let store = store.into_shared();
//!
//! let mut ds = open(&store, "demo.nc");
//! let vi = ds.var_index("temp").unwrap();
//! let mut buf = IoBuffer::new();
//! let slab = ds.read_timestep(vi, &mut buf, 1);
//! assert_eq!(slab.len(), 3 * 4);
//! ds.close();
//! ```

pub mod backend;
pub mod store;

pub use backend::{create, create_classic, open, MemBackend};
pub use store::{Codec, Flavor, MemAtt, MemStore, SharedStore};
