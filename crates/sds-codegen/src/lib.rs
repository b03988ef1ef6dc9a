//! Code generation from SDS metadata.
//!
//! Given a fully populated dataset, emit source text that reads the
//! same file through a format library's own API. Purely a textual
//! serializer of the metadata model; no data I/O happens here.

pub mod f90;

pub use f90::generate_f90;
