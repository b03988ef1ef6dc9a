//! Opening, creating, and serving windowed I/O against a [`MemStore`].

use sds_core::backend::{is_fake_dim, is_reserved_att, BufferSlot};
use sds_core::{Attribute, Backend, Dataset, Dimension, FileKind, SdsError, SdsType, Variable, WindowReq};
use tracing::debug;

use crate::store::{classic_profile_supports, Codec, Flavor, MemAtt, MemStore, SharedStore};

/// One open handle onto a store, bound into the dataset it populated.
/// Closing the dataset closes the handle; the store itself lives on,
/// like a file on disk, and can be opened again.
pub struct MemBackend {
    store: SharedStore,
    closed: bool,
}

/// Per-buffer access state kept by the HDF4-style flavor: the variable
/// whose access handle is currently "open" for that buffer. Reading a
/// different variable through the same buffer releases it and selects
/// the new one, mirroring how the multi-dataset libraries work.
struct H4Access {
    var_id: i32,
}

/// Per-buffer tag for the NetCDF-style flavor; carries no state.
struct NcAccess;

/// Open a store, reading all its metadata into a bound [`Dataset`].
///
/// The store's [`Flavor`] decides the population policies: see the
/// flavor docs. `path` is recorded for diagnostics only.
pub fn open(store: &SharedStore, path: &str) -> Dataset {
    let st = store.borrow();
    let (gatts, dims, vars, kind) = match st.flavor {
        Flavor::NetCdf => open_netcdf(&st),
        Flavor::Hdf4 => open_hdf4(&st),
    };
    debug!(
        path,
        gatts = gatts.len(),
        dims = dims.len(),
        vars = vars.len(),
        "opened in-memory store"
    );
    drop(st);

    let mut ds = Dataset::new(gatts, dims, vars);
    ds.bind_backend(
        path,
        kind,
        Box::new(MemBackend {
            store: store.clone(),
            closed: false,
        }),
    );
    ds
}

fn open_netcdf(st: &MemStore) -> (Vec<Attribute>, Vec<Dimension>, Vec<Variable>, FileKind) {
    let gatts = st.gatts.iter().map(read_att).collect();

    let dims: Vec<Dimension> = st
        .dims
        .iter()
        .enumerate()
        .map(|(id, d)| {
            let mut dim = Dimension::new(d.name.clone(), d.size, d.unlimited);
            dim.id = Some(id as i32);
            dim
        })
        .collect();

    let vars = st
        .vars
        .iter()
        .enumerate()
        .map(|(id, v)| {
            // The NetCDF coordinate-variable convention: the name
            // matches some dimension's name.
            let coordinate = st.dims.iter().any(|d| d.name == v.name);
            let atts = v.atts.iter().map(read_att).collect();
            let mut var = Variable::new(v.name.clone(), v.ty, coordinate, atts, v.dims.clone());
            var.id = Some(id as i32);
            var.compress = report_compression(v.codec, Flavor::NetCdf);
            var
        })
        .collect();

    let kind = if st.classic {
        FileKind::NetCdf3
    } else {
        FileKind::NetCdf4
    };
    (gatts, dims, vars, kind)
}

fn open_hdf4(st: &MemStore) -> (Vec<Attribute>, Vec<Dimension>, Vec<Variable>, FileKind) {
    let gatts = st
        .gatts
        .iter()
        .filter(|a| !is_reserved_att(&a.name))
        .map(read_att)
        .collect();

    // Dimensions are discovered variable by variable, de-duplicated by
    // backend id, with synthetic fakeDim entries of equal size folded
    // into one logical dimension.
    let mut dims: Vec<Dimension> = Vec::new();
    let mut vars: Vec<Variable> = Vec::new();
    for (id, v) in st.vars.iter().enumerate() {
        let mut dim_refs = Vec::with_capacity(v.dims.len());
        for &store_dim in &v.dims {
            let sd = &st.dims[store_dim];
            let dim_id = store_dim as i32;
            let found = dims
                .iter()
                .position(|d| d.id == Some(dim_id))
                .or_else(|| {
                    if is_fake_dim(&sd.name) {
                        dims.iter().position(|d| {
                            is_fake_dim(&d.name) && d.size == sd.size && !d.unlimited
                        })
                    } else {
                        None
                    }
                });
            let di = match found {
                Some(i) => i,
                None => {
                    let mut dim = Dimension::new(sd.name.clone(), sd.size, sd.unlimited);
                    dim.id = Some(dim_id);
                    dims.push(dim);
                    dims.len() - 1
                }
            };
            dim_refs.push(di);
        }

        let atts = v
            .atts
            .iter()
            .filter(|a| !is_reserved_att(&a.name))
            .map(read_att)
            .collect();
        // The multi-dataset libraries report the coordinate flag
        // themselves rather than leaving it to a name convention.
        let mut var = Variable::new(v.name.clone(), v.ty, v.coordinate, atts, dim_refs);
        var.id = Some(id as i32);
        var.compress = report_compression(v.codec, Flavor::Hdf4);
        vars.push(var);
    }

    (gatts, dims, vars, FileKind::Hdf4)
}

fn report_compression(codec: Codec, flavor: Flavor) -> u8 {
    match flavor {
        // The NetCDF open path does not interrogate compression.
        Flavor::NetCdf => 0,
        Flavor::Hdf4 => match codec {
            Codec::None => 0,
            Codec::Deflate(level) => level,
            Codec::Other => 1,
        },
    }
}

/// Convert a stored attribute into a model attribute. Text gains its
/// NUL terminator here, with the count incremented to include it.
fn read_att(a: &MemAtt) -> Attribute {
    if a.ty == SdsType::String {
        let mut data = Vec::with_capacity(a.data.len() + 1);
        data.extend_from_slice(&a.data);
        data.push(0);
        Attribute::new(a.name.clone(), SdsType::String, a.count + 1, &data)
    } else {
        Attribute::new(a.name.clone(), a.ty, a.count, &a.data)
    }
}

/// Convert a model attribute back to stored form, trimming the text
/// terminator a well-formed file would not carry.
fn write_att(a: &Attribute) -> MemAtt {
    if a.sds_type() == SdsType::String {
        let mut data = a.bytes().to_vec();
        if data.last() == Some(&0) {
            data.pop();
        }
        let count = data.len();
        MemAtt {
            name: a.name().to_string(),
            ty: SdsType::String,
            count,
            data,
        }
    } else {
        MemAtt {
            name: a.name().to_string(),
            ty: a.sds_type(),
            count: a.count(),
            data: a.bytes().to_vec(),
        }
    }
}

/// Create a new NetCDF-style store from an unbound dataset, mirroring
/// "write this metadata as a new file": dimensions and variables are
/// defined in the store, backend ids are assigned, and the dataset is
/// bound so subsequent writes go to the new store.
///
/// Panics if the dataset is already bound or carries a format tag; only
/// a fresh or generically copied dataset may create a file.
pub fn create(ds: &mut Dataset, path: &str) -> SharedStore {
    create_flavored(ds, path, MemStore::netcdf())
}

/// Like [`create`], but restricted to the classic NetCDF profile:
/// defining a variable with an unsigned-wide or 64-bit integer type is
/// fatal, the way the version-3 format library rejects such types.
pub fn create_classic(ds: &mut Dataset, path: &str) -> SharedStore {
    create_flavored(ds, path, MemStore::netcdf_classic())
}

fn create_flavored(ds: &mut Dataset, path: &str, mut store: MemStore) -> SharedStore {
    if ds.kind != FileKind::Unknown || ds.is_bound() {
        panic!("attempt to create '{path}' from a dataset that is not an unbound copy");
    }

    for (id, dim) in ds.dims.iter_mut().enumerate() {
        store.add_dim(dim.name.clone(), dim.size, dim.unlimited);
        dim.id = Some(id as i32);
    }

    for (id, var) in ds.vars.iter_mut().enumerate() {
        if store.classic && !classic_profile_supports(var.ty) {
            panic!(
                "variable '{}' type {} is unsupported by the classic NetCDF profile",
                var.name, var.ty
            );
        }
        let dims: Vec<usize> = var.dims.clone();
        let nbytes: usize =
            var.ty.size() * dims.iter().map(|&d| store.dims[d].size).product::<usize>();
        let vi = store.add_var(var.name.clone(), var.ty, &dims, vec![0u8; nbytes]);
        for att in &var.atts {
            store.add_var_att(vi, write_att(att));
        }
        var.id = Some(id as i32);
    }

    for att in &ds.gatts {
        store.add_global_att(write_att(att));
    }

    debug!(path, "created in-memory store");
    let kind = if store.classic {
        FileKind::NetCdf3
    } else {
        FileKind::NetCdf4
    };
    let shared = store.into_shared();
    ds.bind_backend(
        path,
        kind,
        Box::new(MemBackend {
            store: shared.clone(),
            closed: false,
        }),
    );
    shared
}

impl Backend for MemBackend {
    fn read_window(
        &mut self,
        req: &WindowReq<'_>,
        state: &mut BufferSlot,
        dst: &mut [u8],
    ) -> Result<(), SdsError> {
        if self.closed {
            return Err(SdsError::Closed);
        }
        let st = self.store.borrow();
        let var = st
            .vars
            .get(req.var_id as usize)
            .ok_or_else(|| SdsError::Backend(format!("unknown variable id {}", req.var_id)))?;

        match st.flavor {
            Flavor::Hdf4 => select_h4_access(state, req),
            Flavor::NetCdf => {
                if state.is_none() {
                    *state = Some(Box::new(NcAccess));
                }
            }
        }

        let shape: Vec<usize> = var.dims.iter().map(|&d| st.dims[d].size).collect();
        check_bounds(var, &shape, req)?;

        debug!(
            var = req.var_name,
            start = ?req.start,
            count = ?req.count,
            "window read"
        );
        let elem = req.ty.size();
        let mut dst_off = 0;
        each_run(&shape, req.start, req.count, elem, |src_off, len| {
            dst[dst_off..dst_off + len].copy_from_slice(&var.data[src_off..src_off + len]);
            dst_off += len;
        });
        Ok(())
    }

    fn write_window(&mut self, req: &WindowReq<'_>, data: &[u8]) -> Result<(), SdsError> {
        if self.closed {
            return Err(SdsError::Closed);
        }
        let mut st = self.store.borrow_mut();
        if st.flavor == Flavor::Hdf4 {
            return Err(SdsError::Unsupported(
                "writing the multi-dataset format is not implemented".into(),
            ));
        }
        if st.classic && !classic_profile_supports(req.ty) {
            return Err(SdsError::Unsupported(format!(
                "type {} is unsupported by the classic NetCDF profile",
                req.ty
            )));
        }

        let vi = req.var_id as usize;
        if vi >= st.vars.len() {
            return Err(SdsError::Backend(format!("unknown variable id {}", req.var_id)));
        }

        // Writing past the end of the record dimension grows it, the
        // way the real library appends records.
        if !req.start.is_empty() {
            let d0 = st.vars[vi].dims[0];
            let needed = req.start[0] + req.count[0];
            if needed > st.dims[d0].size && st.dims[d0].unlimited {
                grow_records(&mut st, vi, needed);
            }
        }

        let var = &st.vars[vi];
        let shape: Vec<usize> = var.dims.iter().map(|&d| st.dims[d].size).collect();
        check_bounds(var, &shape, req)?;

        debug!(
            var = req.var_name,
            start = ?req.start,
            count = ?req.count,
            "window write"
        );
        let elem = req.ty.size();
        let mut runs: Vec<(usize, usize)> = Vec::new();
        each_run(&shape, req.start, req.count, elem, |off, len| {
            runs.push((off, len));
        });
        let var = &mut st.vars[vi];
        let mut src_off = 0;
        for (dst_off, len) in runs {
            var.data[dst_off..dst_off + len].copy_from_slice(&data[src_off..src_off + len]);
            src_off += len;
        }
        Ok(())
    }

    fn close(&mut self, path: &str) -> Result<(), SdsError> {
        if self.closed {
            return Err(SdsError::Closed);
        }
        self.closed = true;
        debug!(path, "closed in-memory store handle");
        Ok(())
    }
}

/// Keep the HDF4-style per-variable access handle in the buffer slot,
/// releasing it and selecting anew when the variable (or the owning
/// backend family) changes.
fn select_h4_access(state: &mut BufferSlot, req: &WindowReq<'_>) {
    let current = state
        .as_mut()
        .and_then(|s| s.downcast_mut::<H4Access>())
        .map(|a| a.var_id);
    if current != Some(req.var_id) {
        if current.is_some() {
            debug!(var = req.var_name, "releasing previous dataset access");
        }
        *state = Some(Box::new(H4Access { var_id: req.var_id }));
    }
}

fn check_bounds(
    var: &crate::store::MemVar,
    shape: &[usize],
    req: &WindowReq<'_>,
) -> Result<(), SdsError> {
    for axis in 0..shape.len() {
        if req.start[axis] + req.count[axis] > shape[axis] {
            return Err(SdsError::Backend(format!(
                "index {} beyond size {} of axis {} of variable '{}'",
                req.start[axis] + req.count[axis] - 1,
                shape[axis],
                axis,
                var.name
            )));
        }
    }
    Ok(())
}

/// Grow the record dimension to `records` and zero-extend the written
/// variable's data accordingly.
fn grow_records(st: &mut MemStore, vi: usize, records: usize) {
    let d0 = st.vars[vi].dims[0];
    st.dims[d0].size = records;
    let var = &st.vars[vi];
    let nbytes: usize =
        var.ty.size() * var.dims.iter().map(|&d| st.dims[d].size).product::<usize>();
    st.vars[vi].data.resize(nbytes, 0);
}

/// Visit every contiguous byte run of a hyper-rectangular window of a
/// row-major array, in window order. `f` receives the source byte
/// offset and run length; runs are `count[last] * elem` bytes, one per
/// combination of the outer-axis indices. A rank-0 window is a single
/// element.
fn each_run(
    shape: &[usize],
    start: &[usize],
    count: &[usize],
    elem: usize,
    mut f: impl FnMut(usize, usize),
) {
    if shape.is_empty() {
        f(0, elem);
        return;
    }
    if count.iter().any(|&c| c == 0) {
        return; // empty window, e.g. a variable over a fresh record dimension
    }
    let n = shape.len();
    let mut stride = vec![0usize; n];
    let mut s = elem;
    for i in (0..n).rev() {
        stride[i] = s;
        s *= shape[i];
    }
    let run = count[n - 1] * elem;
    let mut pos = vec![0usize; n - 1];
    'runs: loop {
        let mut off = start[n - 1] * stride[n - 1];
        for i in 0..n - 1 {
            off += (start[i] + pos[i]) * stride[i];
        }
        f(off, run);
        for i in (0..n - 1).rev() {
            pos[i] += 1;
            if pos[i] < count[i] {
                continue 'runs;
            }
            pos[i] = 0;
        }
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_run_covers_a_full_array() {
        let mut runs = Vec::new();
        each_run(&[2, 3], &[0, 0], &[2, 3], 4, |off, len| runs.push((off, len)));
        assert_eq!(runs, vec![(0, 12), (12, 12)]);
    }

    #[test]
    fn each_run_walks_an_inner_window() {
        // shape 3x4, bytes, window rows 1..3 x cols 1..3
        let mut runs = Vec::new();
        each_run(&[3, 4], &[1, 1], &[2, 2], 1, |off, len| runs.push((off, len)));
        assert_eq!(runs, vec![(5, 2), (9, 2)]);
    }

    #[test]
    fn each_run_handles_scalars() {
        let mut runs = Vec::new();
        each_run(&[], &[], &[], 8, |off, len| runs.push((off, len)));
        assert_eq!(runs, vec![(0, 8)]);
    }
}
