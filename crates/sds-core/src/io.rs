//! The buffered strided read/write engine.
//!
//! A read or write names a hyper-rectangular window of a variable with
//! one [`Sel`] per axis: the whole axis, or a single coordinate on it.
//! The engine resolves the window to per-axis start/count arrays, sizes
//! the caller's reusable [`IoBuffer`], and delegates the transfer to the
//! dataset's bound backend.
//!
//! # Buffer reuse
//!
//! The caller owns one [`IoBuffer`] per read stream and passes it to
//! every call. Storage grows exact-fit to the largest request seen and
//! never shrinks, so a loop over same-shape windows (per-timestep
//! iteration being the common case) allocates exactly once:
//!
//! ```no_run
//! # use sds_core::{Dataset, IoBuffer};
//! # fn demo(ds: &mut Dataset, vi: usize, steps: usize) {
//! let mut buf = IoBuffer::new();
//! for step in 0..steps {
//!     let slab = ds.read_timestep(vi, &mut buf, step);
//!     // use slab...
//! }
//! # }
//! ```
//!
//! # Failure policy
//!
//! Backend errors, unbound datasets and malformed selector arrays are
//! all fatal: the engine panics with a diagnostic naming the file. The
//! engine does not pre-validate selector bounds against dimension
//! sizes; out-of-range selectors are backend-defined behavior and a
//! documented caller obligation.

use smallvec::SmallVec;

use crate::backend::{BufferSlot, WindowReq};
use crate::dataset::Dataset;

/// Inline capacity of the per-axis scratch arrays; requests with more
/// axes than this spill to the heap rather than failing.
const INLINE_DIMS: usize = 8;

type Extents = SmallVec<[usize; INLINE_DIMS]>;

/// Per-axis window selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sel {
    /// The entire axis, from 0 to the dimension's current size.
    All,
    /// A single coordinate on the axis: a length-1 window.
    At(usize),
}

/// A reusable, caller-owned read buffer.
///
/// Created empty; the engine grows it on demand. The backend-state slot
/// lets a backend keep per-buffer bookkeeping (such as an open
/// per-variable access handle) alive between calls; it is released when
/// the buffer drops or another backend takes the slot over.
#[derive(Default)]
pub struct IoBuffer {
    data: Vec<u8>,
    state: BufferSlot,
}

impl IoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current storage size in bytes: the largest request served so
    /// far. Never decreases across reuse.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Grow storage to hold `needed` bytes, exact-fit, never shrinking.
    fn ensure(&mut self, needed: usize) {
        if self.data.len() < needed {
            self.data.reserve_exact(needed - self.data.len());
            self.data.resize(needed, 0);
        }
    }

    /// Split into the backend-state slot and the first `len` bytes of
    /// storage, for handing to a backend fill call.
    fn backend_parts(&mut self, len: usize) -> (&mut BufferSlot, &mut [u8]) {
        (&mut self.state, &mut self.data[..len])
    }
}

impl Dataset {
    /// Read the entire variable: every axis selected whole.
    pub fn read_all<'b>(&mut self, vi: usize, buf: &'b mut IoBuffer) -> &'b [u8] {
        let ndims = self.vars[vi].ndims();
        let sel: SmallVec<[Sel; INLINE_DIMS]> = SmallVec::from_elem(Sel::All, ndims);
        self.read_window(vi, buf, &sel)
    }

    /// Read one full slab at `step` on the first axis, the common case
    /// when axis 0 is the unlimited/time dimension.
    ///
    /// Panics for scalar variables; use [`Dataset::read_all`] there.
    pub fn read_timestep<'b>(&mut self, vi: usize, buf: &'b mut IoBuffer, step: usize) -> &'b [u8] {
        let ndims = self.vars[vi].ndims();
        assert!(ndims > 0, "timestep read requires at least one axis");
        let mut sel: SmallVec<[Sel; INLINE_DIMS]> = SmallVec::from_elem(Sel::All, ndims);
        sel[0] = Sel::At(step);
        self.read_window(vi, buf, &sel)
    }

    /// Read the whole of the named variable, or `None` when no such
    /// variable exists.
    pub fn read_named<'b>(&mut self, name: &str, buf: &'b mut IoBuffer) -> Option<&'b [u8]> {
        let vi = self.var_index(name)?;
        Some(self.read_all(vi, buf))
    }

    /// Read an arbitrary window, one selector per axis.
    ///
    /// Returns a borrowed view of exactly the window's bytes, valid
    /// until the buffer is reused or dropped.
    pub fn read_window<'b>(&mut self, vi: usize, buf: &'b mut IoBuffer, sel: &[Sel]) -> &'b [u8] {
        let (start, count, needed) = self.resolve_window(vi, sel);
        buf.ensure(needed);

        let var = &self.vars[vi];
        let req = WindowReq {
            path: &self.path,
            var_name: &var.name,
            var_id: var.id.expect("bound variable has no backend id"),
            ty: var.ty,
            start: &start,
            count: &count,
        };
        // resolve_window already ruled out the unbound case
        let backend = self.backend.as_mut().expect("dataset is bound");
        let (state, dst) = buf.backend_parts(needed);
        if let Err(e) = backend.read_window(&req, state, dst) {
            panic!("{}: error reading variable '{}': {e}", req.path, req.var_name);
        }
        &buf.data[..needed]
    }

    /// Write the entire variable from `data`.
    pub fn write_all(&mut self, vi: usize, data: &[u8]) {
        let ndims = self.vars[vi].ndims();
        let sel: SmallVec<[Sel; INLINE_DIMS]> = SmallVec::from_elem(Sel::All, ndims);
        self.write_window(vi, data, &sel);
    }

    /// Write an arbitrary window from `data`, one selector per axis.
    /// `data` must hold exactly the window's bytes.
    pub fn write_window(&mut self, vi: usize, data: &[u8], sel: &[Sel]) {
        let (start, count, needed) = self.resolve_window(vi, sel);
        assert_eq!(
            data.len(),
            needed,
            "write data length does not match the selected window"
        );

        let var = &self.vars[vi];
        let req = WindowReq {
            path: &self.path,
            var_name: &var.name,
            var_id: var.id.expect("bound variable has no backend id"),
            ty: var.ty,
            start: &start,
            count: &count,
        };
        let backend = self.backend.as_mut().expect("dataset is bound");
        if let Err(e) = backend.write_window(&req, data) {
            panic!("{}: error writing variable '{}': {e}", req.path, req.var_name);
        }
    }

    /// Resolve selectors to start/count arrays and the window's byte
    /// size, checking the invariants that make a request well-formed.
    fn resolve_window(&self, vi: usize, sel: &[Sel]) -> (Extents, Extents, usize) {
        if !self.is_bound() {
            panic!(
                "attempt to access data of dataset '{}' with no bound backend",
                self.path
            );
        }
        let var = &self.vars[vi];
        assert_eq!(
            sel.len(),
            var.ndims(),
            "selector array length does not match the rank of variable '{}'",
            var.name
        );

        let mut start: Extents = SmallVec::with_capacity(sel.len());
        let mut count: Extents = SmallVec::with_capacity(sel.len());
        let mut elems = 1usize;
        for (&s, &d) in sel.iter().zip(&var.dims) {
            let (s0, c) = match s {
                Sel::All => (0, self.dims[d].size),
                Sel::At(i) => (i, 1),
            };
            start.push(s0);
            count.push(c);
            elems *= c;
        }
        (start, count, var.ty.size() * elems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::backend::Backend;
    use crate::dimension::Dimension;
    use crate::error::SdsError;
    use crate::magic::FileKind;
    use crate::types::SdsType;
    use crate::variable::Variable;

    /// Minimal backend serving a single flat data array, recording how
    /// it was called.
    struct FlatBackend {
        data: Vec<u8>,
        calls: std::rc::Rc<std::cell::RefCell<Vec<(Vec<usize>, Vec<usize>)>>>,
    }

    impl Backend for FlatBackend {
        fn read_window(
            &mut self,
            req: &WindowReq<'_>,
            _state: &mut BufferSlot,
            dst: &mut [u8],
        ) -> Result<(), SdsError> {
            self.calls
                .borrow_mut()
                .push((req.start.to_vec(), req.count.to_vec()));
            let n = dst.len().min(self.data.len());
            dst[..n].copy_from_slice(&self.data[..n]);
            Ok(())
        }

        fn write_window(&mut self, _req: &WindowReq<'_>, _data: &[u8]) -> Result<(), SdsError> {
            Err(SdsError::Unsupported("write not available".into()))
        }

        fn close(&mut self, _path: &str) -> Result<(), SdsError> {
            Ok(())
        }
    }

    fn bound_dataset() -> (Dataset, std::rc::Rc<std::cell::RefCell<Vec<(Vec<usize>, Vec<usize>)>>>) {
        let dims = vec![
            Dimension::new("t", 2, true),
            Dimension::new("y", 3, false),
            Dimension::new("x", 4, false),
        ];
        let mut var = Variable::new("v", SdsType::F32, false, Vec::<Attribute>::new(), vec![0, 1, 2]);
        var.id = Some(0);
        let mut ds = Dataset::new(Vec::new(), dims, vec![var]);
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let backend = FlatBackend {
            data: vec![7u8; 2 * 3 * 4 * 4],
            calls: calls.clone(),
        };
        ds.bind_backend("test.nc", FileKind::NetCdf3, Box::new(backend));
        (ds, calls)
    }

    #[test]
    fn full_read_covers_every_element() {
        let (mut ds, calls) = bound_dataset();
        let mut buf = IoBuffer::new();
        let view = ds.read_all(0, &mut buf);
        assert_eq!(view.len(), 24 * 4);
        assert_eq!(calls.borrow()[0], (vec![0, 0, 0], vec![2, 3, 4]));
    }

    #[test]
    fn timestep_read_fixes_the_first_axis() {
        let (mut ds, calls) = bound_dataset();
        let mut buf = IoBuffer::new();
        let view = ds.read_timestep(0, &mut buf, 1);
        assert_eq!(view.len(), 12 * 4);
        assert_eq!(calls.borrow()[0], (vec![1, 0, 0], vec![1, 3, 4]));
    }

    #[test]
    fn fully_pinned_selector_yields_one_element() {
        let (mut ds, calls) = bound_dataset();
        let mut buf = IoBuffer::new();
        let view = ds.read_window(0, &mut buf, &[Sel::At(1), Sel::At(2), Sel::At(3)]);
        assert_eq!(view.len(), 4);
        assert_eq!(calls.borrow()[0], (vec![1, 2, 3], vec![1, 1, 1]));
    }

    #[test]
    fn buffer_grows_once_for_non_increasing_requests() {
        let (mut ds, _) = bound_dataset();
        let mut buf = IoBuffer::new();

        ds.read_all(0, &mut buf);
        let cap = buf.capacity();
        assert_eq!(cap, 96);

        ds.read_timestep(0, &mut buf, 0);
        assert_eq!(buf.capacity(), cap, "smaller read must not reallocate");
        ds.read_window(0, &mut buf, &[Sel::At(0), Sel::At(0), Sel::At(0)]);
        assert_eq!(buf.capacity(), cap, "smaller read must not reallocate");
    }

    #[test]
    fn buffer_grows_exactly_to_a_larger_request() {
        let (mut ds, _) = bound_dataset();
        let mut buf = IoBuffer::new();

        ds.read_timestep(0, &mut buf, 0);
        assert_eq!(buf.capacity(), 48);
        ds.read_all(0, &mut buf);
        assert_eq!(buf.capacity(), 96, "growth is exact-fit");
    }

    #[test]
    fn returned_view_is_sized_to_the_window_not_the_buffer() {
        let (mut ds, _) = bound_dataset();
        let mut buf = IoBuffer::new();
        ds.read_all(0, &mut buf);
        let view = ds.read_timestep(0, &mut buf, 1);
        assert_eq!(view.len(), 48);
    }

    #[test]
    fn read_named_misses_return_none() {
        let (mut ds, _) = bound_dataset();
        let mut buf = IoBuffer::new();
        assert!(ds.read_named("nope", &mut buf).is_none());
        assert!(ds.read_named("v", &mut buf).is_some());
    }

    #[test]
    #[should_panic(expected = "no bound backend")]
    fn reading_an_unbound_dataset_panics() {
        let dims = vec![Dimension::new("x", 2, false)];
        let var = Variable::new("v", SdsType::I8, false, Vec::new(), vec![0]);
        let mut ds = Dataset::new(Vec::new(), dims, vec![var]);
        let mut buf = IoBuffer::new();
        ds.read_all(0, &mut buf);
    }

    #[test]
    #[should_panic(expected = "selector array length")]
    fn wrong_selector_arity_panics() {
        let (mut ds, _) = bound_dataset();
        let mut buf = IoBuffer::new();
        ds.read_window(0, &mut buf, &[Sel::All]);
    }

    #[test]
    #[should_panic(expected = "write not available")]
    fn backend_write_errors_are_fatal() {
        let (mut ds, _) = bound_dataset();
        let data = vec![0u8; 96];
        ds.write_all(0, &data);
    }
}
