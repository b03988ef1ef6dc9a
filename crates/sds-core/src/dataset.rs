//! The top-level container for one scientific data file's metadata.

use crate::attribute::Attribute;
use crate::backend::Backend;
use crate::dimension::Dimension;
use crate::filter;
use crate::magic::FileKind;
use crate::variable::Variable;

/// All metadata of one opened or in-memory scientific data file:
/// global attributes, dimensions, variables, and the backend binding
/// used to read and write variable data.
///
/// The dataset exclusively owns its attribute, dimension and variable
/// lists; dropping it releases everything. A dataset whose backend is
/// unbound (fresh from [`Dataset::new`] or [`Dataset::generic_copy`])
/// is a pure in-memory template: any data read or write against it is a
/// programming error and panics.
pub struct Dataset {
    /// Path of the backing file; empty for unbound templates.
    pub path: String,
    /// Format of the backing file; `Unknown` for unbound templates.
    pub kind: FileKind,
    /// Global attributes, in file order.
    pub gatts: Vec<Attribute>,
    /// Dimensions, in file order.
    pub dims: Vec<Dimension>,
    /// Variables, in file order.
    pub vars: Vec<Variable>,
    unlim: Option<usize>,
    pub(crate) backend: Option<Box<dyn Backend>>,
}

impl Dataset {
    /// Build an unbound dataset from its parts, as when assembling
    /// metadata from scratch before creating a new file.
    ///
    /// The convenience unlimited-dimension index is set only when
    /// exactly one unlimited dimension exists. Several unlimited
    /// dimensions (possible in HDF4-style files) leave it unset; that
    /// is not an error.
    pub fn new(gatts: Vec<Attribute>, dims: Vec<Dimension>, vars: Vec<Variable>) -> Self {
        let unlim = single_unlimited(&dims);
        Dataset {
            path: String::new(),
            kind: FileKind::Unknown,
            gatts,
            dims,
            vars,
            unlim,
            backend: None,
        }
    }

    /// Look up a global attribute by name.
    pub fn att(&self, name: &str) -> Option<&Attribute> {
        self.gatts.iter().find(|a| a.name() == name)
    }

    /// Look up a dimension by name.
    pub fn dim(&self, name: &str) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.name == name)
    }

    /// Index of the named dimension in [`Dataset::dims`].
    pub fn dim_index(&self, name: &str) -> Option<usize> {
        self.dims.iter().position(|d| d.name == name)
    }

    /// Look up a variable by name.
    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Index of the named variable in [`Dataset::vars`].
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    /// The unique unlimited dimension, when exactly one exists.
    pub fn unlimited_dim(&self) -> Option<&Dimension> {
        self.unlim.map(|i| &self.dims[i])
    }

    /// Recompute the unlimited-dimension convenience index after the
    /// dimension list has been edited in place.
    pub fn refresh_unlimited(&mut self) {
        self.unlim = single_unlimited(&self.dims);
    }

    /// The shape of a variable: its dimension sizes, outermost first.
    pub fn var_shape(&self, var: &Variable) -> Vec<usize> {
        var.dims.iter().map(|&d| self.dims[d].size).collect()
    }

    /// Total element count of a variable: the product of its dimension
    /// sizes. A scalar (zero dimensions) counts one element.
    pub fn var_count(&self, var: &Variable) -> usize {
        var.dims.iter().map(|&d| self.dims[d].size).product()
    }

    /// Total byte size of a variable's data.
    pub fn var_size(&self, var: &Variable) -> usize {
        var.ty.size() * self.var_count(var)
    }

    /// Keep only the named global attributes; the rest are dropped.
    pub fn keep_atts(&mut self, names: &[&str]) {
        self.gatts = filter::keep(std::mem::take(&mut self.gatts), names);
    }

    /// Drop the named global attributes; the rest are kept.
    pub fn delete_atts(&mut self, names: &[&str]) {
        self.gatts = filter::delete(std::mem::take(&mut self.gatts), names);
    }

    /// Keep only the named variables; the rest are dropped.
    pub fn keep_vars(&mut self, names: &[&str]) {
        self.vars = filter::keep(std::mem::take(&mut self.vars), names);
    }

    /// Drop the named variables; the rest are kept.
    pub fn delete_vars(&mut self, names: &[&str]) {
        self.vars = filter::delete(std::mem::take(&mut self.vars), names);
    }

    /// Keep only the named dimensions, remapping every surviving
    /// variable's dimension references.
    ///
    /// Panics if a surviving variable still references a discarded
    /// dimension; a dataset with a dangling dimension reference is
    /// invalid by construction. Delete such variables first.
    pub fn keep_dims(&mut self, names: &[&str]) {
        let old = std::mem::take(&mut self.dims);
        let old_names: Vec<String> = old.iter().map(|d| d.name.clone()).collect();
        self.dims = filter::keep(old, names);
        self.remap_var_dims(&old_names);
        self.refresh_unlimited();
    }

    /// Drop the named dimensions, remapping every surviving variable's
    /// dimension references. Panics like [`Dataset::keep_dims`].
    pub fn delete_dims(&mut self, names: &[&str]) {
        let old = std::mem::take(&mut self.dims);
        let old_names: Vec<String> = old.iter().map(|d| d.name.clone()).collect();
        self.dims = filter::delete(old, names);
        self.remap_var_dims(&old_names);
        self.refresh_unlimited();
    }

    fn remap_var_dims(&mut self, old_names: &[String]) {
        for var in &mut self.vars {
            for d in &mut var.dims {
                let name = &old_names[*d];
                *d = match self.dims.iter().position(|nd| nd.name == *name) {
                    Some(i) => i,
                    None => panic!(
                        "variable '{}' references discarded dimension '{}'",
                        var.name, name
                    ),
                };
            }
        }
    }

    /// Deep, backend-independent copy of this dataset's metadata.
    ///
    /// The copy shares no storage with the original: the format tag is
    /// reset to `Unknown`, the backend binding is dropped, and every
    /// backend-private id is cleared, so the copy can be handed to any
    /// backend to create a new file. Variable dimension references are
    /// re-resolved by name against the copied dimension list.
    ///
    /// Panics if a variable references a dimension name that does not
    /// exist in the copied dimension list.
    pub fn generic_copy(&self) -> Dataset {
        let gatts = self.gatts.clone();
        let dims: Vec<Dimension> = self
            .dims
            .iter()
            .map(|d| Dimension::new(d.name.clone(), d.size, d.unlimited))
            .collect();
        let vars = copy_vars(&self.vars, &self.dims, &dims);
        Dataset::new(gatts, dims, vars)
    }

    /// Whether this dataset is bound to a live backend.
    pub fn is_bound(&self) -> bool {
        self.backend.is_some()
    }

    /// Bind this dataset to a backend, recording the path and format of
    /// the file the backend serves. Called by backends from their open
    /// and create paths, not by ordinary callers.
    pub fn bind_backend(&mut self, path: impl Into<String>, kind: FileKind, backend: Box<dyn Backend>) {
        self.path = path.into();
        self.kind = kind;
        self.backend = Some(backend);
    }

    /// Close the backing file and release the metadata.
    ///
    /// The backend is released before the metadata lists drop, since a
    /// backend may still need them to finalize a freshly created file.
    /// Panics if the backend reports an error while closing. Unbound
    /// datasets close trivially.
    pub fn close(mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.close(&self.path) {
                panic!("{}: error closing file: {e}", self.path);
            }
        }
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        // Best-effort close for datasets that go out of scope while
        // still bound; errors cannot be reported from a destructor.
        if let Some(mut backend) = self.backend.take() {
            let _ = backend.close(&self.path);
        }
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("gatts", &self.gatts.len())
            .field("dims", &self.dims.len())
            .field("vars", &self.vars.len())
            .field("bound", &self.backend.is_some())
            .finish()
    }
}

/// Copy a variable list for a new dataset, re-resolving dimension
/// references by name against `new_dims`.
///
/// Panics when a referenced dimension name is missing from `new_dims`.
pub fn copy_vars(vars: &[Variable], old_dims: &[Dimension], new_dims: &[Dimension]) -> Vec<Variable> {
    vars.iter()
        .map(|v| {
            let dims = v
                .dims
                .iter()
                .map(|&d| {
                    let name = &old_dims[d].name;
                    new_dims
                        .iter()
                        .position(|nd| nd.name == *name)
                        .unwrap_or_else(|| {
                            panic!(
                                "could not find new dimension named '{}' when copying var '{}'",
                                name, v.name
                            )
                        })
                })
                .collect();
            let mut copy = Variable::new(v.name.clone(), v.ty, v.coordinate, v.atts.clone(), dims);
            copy.compress = v.compress;
            copy
        })
        .collect()
}

fn single_unlimited(dims: &[Dimension]) -> Option<usize> {
    let mut unlim = None;
    for (i, dim) in dims.iter().enumerate() {
        if dim.unlimited {
            if unlim.is_some() {
                return None; // more than one unlimited dimension
            }
            unlim = Some(i);
        }
    }
    unlim
}
