//! Deterministic ordering of attributes and variables.
//!
//! Code generation groups identically-typed, identically-shaped values
//! into single declarations, which requires a total order that keeps
//! every type class contiguous. The order is produced by a stable
//! selection sort: the first-seen minimum is extracted on every pass,
//! so entries with equal keys keep their original relative order.

use std::cmp::Ordering;

use crate::attribute::Attribute;
use crate::dimension::Dimension;
use crate::types::SdsType;
use crate::variable::Variable;

/// Type-class rank. The exact values are an internal convention; what
/// matters is that every member of a class shares one rank so a sorted
/// list never interleaves classes.
fn type_order(ty: SdsType) -> u8 {
    match ty {
        SdsType::F32 => 1,
        SdsType::F64 => 2,
        SdsType::I8
        | SdsType::U8
        | SdsType::I16
        | SdsType::U16
        | SdsType::I32
        | SdsType::U32
        | SdsType::I64
        | SdsType::U64 => 3,
        SdsType::String => 4,
        SdsType::NoType => panic!("cannot order the no-type sentinel"),
    }
}

fn att_cmp(a: &Attribute, b: &Attribute) -> Ordering {
    type_order(a.sds_type())
        .cmp(&type_order(b.sds_type()))
        .then(a.count().cmp(&b.count()))
}

/// Sort attributes by type class, then ascending element count.
pub fn sort_attributes(atts: &mut Vec<Attribute>) {
    selection_sort(atts, att_cmp);
}

/// Sort variables by type class, then ascending dimension count, then
/// lexicographically ascending dimension sizes (outermost first).
///
/// `dims` is the dimension list of the owning dataset.
pub fn sort_variables(vars: &mut Vec<Variable>, dims: &[Dimension]) {
    selection_sort(vars, |a, b| {
        type_order(a.ty)
            .cmp(&type_order(b.ty))
            .then(a.dims.len().cmp(&b.dims.len()))
            .then_with(|| {
                for (&da, &db) in a.dims.iter().zip(&b.dims) {
                    let ord = dims[da].size.cmp(&dims[db].size);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            })
    });
}

impl crate::dataset::Dataset {
    /// Sort this dataset's variables in place; see [`sort_variables`].
    pub fn sort_vars(&mut self) {
        sort_variables(&mut self.vars, &self.dims);
    }
}

/// Stable selection sort: repeatedly extract the first-seen minimum.
fn selection_sort<T>(v: &mut Vec<T>, cmp: impl Fn(&T, &T) -> Ordering) {
    let mut rest = std::mem::take(v);
    let mut sorted = Vec::with_capacity(rest.len());
    while !rest.is_empty() {
        let mut min = 0;
        for j in 1..rest.len() {
            if cmp(&rest[j], &rest[min]) == Ordering::Less {
                min = j;
            }
        }
        sorted.push(rest.remove(min));
    }
    *v = sorted;
}
