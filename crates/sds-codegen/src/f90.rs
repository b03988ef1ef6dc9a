//! Fortran 90 emission: declarations plus `nf90_*` read calls for every
//! dimension, variable and attribute of a dataset.
//!
//! The dataset is sorted first so identically-typed, identically-shaped
//! variables collapse into shared declaration statements.

use std::io::{self, Write};

use sds_core::{sort_attributes, Dataset, SdsType, Variable};

const CHECK_FUNCTION: &str = "\
subroutine checknc(status)
    integer, intent(in) :: status

    if (status /= NF90_NOERR) then
        print *, nf90_strerror(status)
        stop
    end if
end subroutine checknc
";

/// Fortran 90 type spelling for a variable or attribute type.
fn f90_type(ty: SdsType) -> &'static str {
    match ty {
        SdsType::I8 | SdsType::U8 | SdsType::I16 | SdsType::U16 | SdsType::I32 | SdsType::U32 => {
            "integer"
        }
        SdsType::I64 | SdsType::U64 => "integer*8",
        SdsType::F32 => "real*4",
        SdsType::F64 => "real*8",
        SdsType::String => "character",
        SdsType::NoType => panic!("cannot generate code for the no-type sentinel"),
    }
}

/// The `dimension(nx,ny)` clause of a declaration, innermost axis
/// first as Fortran expects; `None` for scalars.
fn dimension_clause(ds: &Dataset, var: &Variable) -> Option<String> {
    if var.dims.is_empty() {
        return None;
    }
    let sizes: Vec<String> = var
        .dims
        .iter()
        .rev()
        .map(|&d| ds.dims[d].size.to_string())
        .collect();
    Some(format!("dimension({})", sizes.join(",")))
}

/// Emit Fortran 90 code that opens the file and reads every dimension,
/// variable, and (optionally) attribute.
///
/// The dataset's attribute and variable lists are sorted in place as a
/// side effect, so grouped declarations come out in a deterministic
/// order.
pub fn generate_f90(ds: &mut Dataset, atts: bool, w: &mut dyn Write) -> io::Result<()> {
    sort_attributes(&mut ds.gatts);
    ds.sort_vars();
    for var in &mut ds.vars {
        sort_attributes(&mut var.atts);
    }

    writeln!(w, "use netcdf")?;
    writeln!(w)?;
    writeln!(w, "integer :: ncid")?;

    if !ds.dims.is_empty() {
        let ids: Vec<String> = ds.dims.iter().map(|d| format!("{}_dimid", d.name)).collect();
        writeln!(w, "integer :: {}", ids.join(", "))?;
    }
    if !ds.vars.is_empty() {
        let ids: Vec<String> = ds.vars.iter().map(|v| format!("{}_id", v.name)).collect();
        writeln!(w, "integer :: {}", ids.join(", "))?;
    }
    writeln!(w)?;

    // Data declarations, one statement per (type, shape) group. The
    // sort above guarantees group members are adjacent.
    writeln!(w, "! variable data")?;
    let mut group: Vec<&Variable> = Vec::new();
    for var in &ds.vars {
        let extends = group.last().is_some_and(|prev| {
            f90_type(prev.ty) == f90_type(var.ty)
                && dimension_clause(ds, prev) == dimension_clause(ds, var)
        });
        if !extends && !group.is_empty() {
            write_declaration(ds, &group, w)?;
            group.clear();
        }
        group.push(var);
    }
    if !group.is_empty() {
        write_declaration(ds, &group, w)?;
    }
    writeln!(w)?;

    writeln!(w, "! open file")?;
    writeln!(
        w,
        "call checknc( nf90_open(\"{}\", NF90_NOWRITE, ncid) )",
        ds.path
    )?;
    writeln!(w)?;

    writeln!(w, "! read dimensions")?;
    for dim in &ds.dims {
        writeln!(
            w,
            "call checknc( nf90_inq_dimid(ncid, \"{0}\", {0}_dimid) )",
            dim.name
        )?;
    }
    writeln!(w)?;

    writeln!(w, "! get variable IDs")?;
    for var in &ds.vars {
        writeln!(
            w,
            "call checknc( nf90_inq_varid(ncid, \"{0}\", {0}_id) )",
            var.name
        )?;
    }
    writeln!(w)?;

    writeln!(w, "! read var data")?;
    for var in &ds.vars {
        writeln!(w, "call checknc( nf90_get_var(ncid, {0}_id, {0}) )", var.name)?;
    }
    writeln!(w)?;

    if atts {
        write_attribute_section(ds, w)?;
    }

    writeln!(w, "! close the file")?;
    writeln!(w, "call checknc( nf90_close(ncid) )")?;
    writeln!(w)?;
    w.write_all(CHECK_FUNCTION.as_bytes())
}

fn write_declaration(ds: &Dataset, group: &[&Variable], w: &mut dyn Write) -> io::Result<()> {
    let first = group[0];
    let names: Vec<&str> = group.iter().map(|v| v.name.as_str()).collect();
    match dimension_clause(ds, first) {
        Some(dims) => writeln!(w, "{}, {} :: {}", f90_type(first.ty), dims, names.join(", ")),
        None => writeln!(w, "{} :: {}", f90_type(first.ty), names.join(", ")),
    }
}

fn write_attribute_section(ds: &Dataset, w: &mut dyn Write) -> io::Result<()> {
    if !ds.gatts.is_empty() {
        writeln!(w, "! read global attributes")?;
        for att in &ds.gatts {
            writeln!(
                w,
                "call checknc( nf90_get_att(ncid, NF90_GLOBAL, \"{0}\", {0}) )",
                att.name()
            )?;
        }
        writeln!(w)?;
    }

    writeln!(w, "! read var attributes")?;
    for var in &ds.vars {
        for att in &var.atts {
            writeln!(
                w,
                "call checknc( nf90_get_att(ncid, {0}_id, \"{1}\", {0}_{1}) )",
                var.name,
                att.name()
            )?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sds_core::{Attribute, Dimension};

    fn sample() -> Dataset {
        let dims = vec![
            Dimension::new("time", 2, true),
            Dimension::new("lat", 3, false),
            Dimension::new("lon", 4, false),
        ];
        let var = |name: &str, ty, d: Vec<usize>| Variable::new(name, ty, false, Vec::new(), d);
        let vars = vec![
            var("press", SdsType::F32, vec![0, 1, 2]),
            var("temp", SdsType::F32, vec![0, 1, 2]),
            var("mask", SdsType::I32, vec![1, 2]),
        ];
        let mut ds = Dataset::new(
            vec![Attribute::text("title", "gen test")],
            dims,
            vars,
        );
        ds.path = "gen.nc".to_string();
        ds
    }

    fn render(ds: &mut Dataset, atts: bool) -> String {
        let mut out = Vec::new();
        generate_f90(ds, atts, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn same_shape_variables_share_one_declaration() {
        let mut ds = sample();
        let text = render(&mut ds, false);
        assert!(text.contains("real*4, dimension(4,3,2) :: press, temp"));
        assert!(text.contains("integer, dimension(4,3) :: mask"));
    }

    #[test]
    fn read_calls_cover_every_entity() {
        let mut ds = sample();
        let text = render(&mut ds, false);
        assert!(text.contains("call checknc( nf90_open(\"gen.nc\", NF90_NOWRITE, ncid) )"));
        assert!(text.contains("nf90_inq_dimid(ncid, \"lat\", lat_dimid)"));
        assert!(text.contains("nf90_inq_varid(ncid, \"temp\", temp_id)"));
        assert!(text.contains("nf90_get_var(ncid, mask_id, mask)"));
        assert!(text.contains("subroutine checknc(status)"));
    }

    #[test]
    fn attribute_reads_are_optional() {
        let mut ds = sample();
        let without = render(&mut ds, false);
        assert!(!without.contains("nf90_get_att"));

        let mut ds = sample();
        let with = render(&mut ds, true);
        assert!(with.contains("nf90_get_att(ncid, NF90_GLOBAL, \"title\", title)"));
    }

    #[test]
    fn scalars_declare_without_a_dimension_clause() {
        let mut ds = sample();
        ds.vars.push(Variable::new(
            "mean",
            SdsType::F64,
            false,
            Vec::new(),
            Vec::new(),
        ));
        let text = render(&mut ds, false);
        assert!(text.contains("real*8 :: mean"));
    }
}
