//! Named axes of a dataset.

/// A named axis with a size, optionally unlimited (growable).
///
/// NetCDF-style files carry at most one unlimited dimension; HDF4-style
/// files may carry several, one per growable data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Name, unique within the owning dataset.
    pub name: String,
    /// Element count along this axis. For an unlimited dimension this
    /// is the size observed when the file was opened.
    pub size: usize,
    /// Whether this axis may grow by appending records.
    pub unlimited: bool,
    /// Backend-private identifier, assigned when a file is opened or
    /// created. `None` for metadata that has never been bound to a
    /// backend (built from scratch, or produced by a generic copy).
    pub id: Option<i32>,
}

impl Dimension {
    /// A fresh, unbound dimension.
    pub fn new(name: impl Into<String>, size: usize, unlimited: bool) -> Self {
        Dimension {
            name: name.into(),
            size,
            unlimited,
            id: None,
        }
    }
}
