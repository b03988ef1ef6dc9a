//! Rendering of dataset metadata and variable values.
//!
//! Every printer writes to a caller-supplied writer so the output is
//! testable without a terminal; `main` points them at stdout.

use std::io::{self, Write};

use sds_core::{Attribute, Dataset, IoBuffer, SdsType, Variable};

// ANSI SGR sequences. Color selection mirrors the traditional palette:
// types bright cyan, attribute names yellow, variable names green,
// dimension names magenta, values bright blue.
const TYPE_COLOR: &str = "\x1b[36;1m";
const ATT_COLOR: &str = "\x1b[33m";
const VAR_COLOR: &str = "\x1b[32m";
const DIM_COLOR: &str = "\x1b[35m";
const VALUE_COLOR: &str = "\x1b[34;1m";
const QUOTE_COLOR: &str = "\x1b[34m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Output options shared by all printers.
#[derive(Debug, Clone)]
pub struct Opts {
    pub color: bool,
    /// Separator between listed names/values: a space normally, a
    /// newline in single-column mode.
    pub separator: String,
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            color: false,
            separator: " ".to_string(),
        }
    }
}

impl Opts {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// A named variable was not found in the file.
#[derive(Debug)]
pub struct NotFound(pub String);

fn var_or_missing<'d>(ds: &'d Dataset, name: &str) -> Result<&'d Variable, NotFound> {
    ds.var(name).ok_or_else(|| NotFound(name.to_string()))
}

/// Format one element of a raw native-order value buffer.
fn format_value(ty: SdsType, bytes: &[u8], idx: usize) -> String {
    let w = ty.size();
    let at = &bytes[idx * w..idx * w + w];
    match ty {
        SdsType::NoType => "?".to_string(),
        SdsType::I8 => (at[0] as i8).to_string(),
        SdsType::U8 => at[0].to_string(),
        SdsType::I16 => i16::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::U16 => u16::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::I32 => i32::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::U32 => u32::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::I64 => i64::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::U64 => u64::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::F32 => f32::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::F64 => f64::from_ne_bytes(at.try_into().unwrap()).to_string(),
        SdsType::String => String::from_utf8_lossy(std::slice::from_ref(&at[0])).into_owned(),
    }
}

fn write_att(w: &mut dyn Write, att: &Attribute, opts: &Opts) -> io::Result<()> {
    let ty = format!("{:7}", att.sds_type().name());
    write!(
        w,
        "  {}{}",
        opts.paint(TYPE_COLOR, &ty),
        opts.paint(ATT_COLOR, att.name())
    )?;

    if att.sds_type() == SdsType::String {
        // Advertised length excludes the NUL terminator.
        write!(w, "[{}]", att.count().saturating_sub(1))?;
        let text = att.as_str().unwrap_or("<non-utf8>");
        writeln!(
            w,
            " = {}{}{}",
            opts.paint(QUOTE_COLOR, "\""),
            opts.paint(VALUE_COLOR, text),
            opts.paint(QUOTE_COLOR, "\"")
        )?;
        return Ok(());
    }

    write!(w, " = ")?;
    for i in 0..att.count() {
        if i > 0 {
            write!(w, ", ")?;
        }
        let v = format_value(att.sds_type(), att.bytes(), i);
        write!(w, "{}", opts.paint(VALUE_COLOR, &v))?;
    }
    writeln!(w)
}

/// The default, fully colored human-readable summary of a file.
pub fn print_summary(w: &mut dyn Write, ds: &Dataset, opts: &Opts) -> io::Result<()> {
    writeln!(
        w,
        "{}: {} format",
        opts.paint(BOLD, &ds.path),
        ds.kind.name()
    )?;
    writeln!(
        w,
        "  {}, {}, {}",
        opts.paint(ATT_COLOR, &format!("{} global attributes", ds.gatts.len())),
        opts.paint(DIM_COLOR, &format!("{} dimensions", ds.dims.len())),
        opts.paint(VAR_COLOR, &format!("{} variables", ds.vars.len()))
    )?;

    if ds.gatts.is_empty() {
        writeln!(w, "\n - no global attributes -")?;
    } else {
        writeln!(w, "\nGlobal attributes:")?;
        for att in &ds.gatts {
            write_att(w, att, opts)?;
        }
    }

    writeln!(w, "\nDimensions:")?;
    for dim in &ds.dims {
        writeln!(
            w,
            "  {} = {}{}",
            opts.paint(DIM_COLOR, &dim.name),
            opts.paint(VALUE_COLOR, &dim.size.to_string()),
            if dim.unlimited { " (unlimited)" } else { "" }
        )?;
    }

    writeln!(w, "\nVariables:")?;
    for var in &ds.vars {
        writeln!(w)?;
        write!(
            w,
            "{} {}",
            opts.paint(TYPE_COLOR, var.ty.name()),
            opts.paint(VAR_COLOR, &var.name)
        )?;
        for &d in &var.dims {
            let dim = &ds.dims[d];
            write!(
                w,
                "[{}={}]",
                opts.paint(DIM_COLOR, &dim.name),
                dim.size
            )?;
        }
        writeln!(w, "{}", if var.coordinate { " (coordinate)" } else { "" })?;
        for att in &var.atts {
            write_att(w, att, opts)?;
        }
    }
    Ok(())
}

/// List attribute names of the file, or of one variable.
pub fn print_att_list(
    w: &mut dyn Write,
    ds: &Dataset,
    var: Option<&str>,
    opts: &Opts,
) -> Result<(), NotFound> {
    let atts = match var {
        Some(name) => &var_or_missing(ds, name)?.atts,
        None => &ds.gatts,
    };
    let names: Vec<String> = atts
        .iter()
        .map(|a| opts.paint(ATT_COLOR, a.name()))
        .collect();
    finish_list(w, names, opts);
    Ok(())
}

/// List dimension names of the file, or of one variable.
pub fn print_dim_list(
    w: &mut dyn Write,
    ds: &Dataset,
    var: Option<&str>,
    opts: &Opts,
) -> Result<(), NotFound> {
    let names: Vec<String> = match var {
        Some(name) => var_or_missing(ds, name)?
            .dims
            .iter()
            .map(|&d| opts.paint(DIM_COLOR, &ds.dims[d].name))
            .collect(),
        None => ds
            .dims
            .iter()
            .map(|d| opts.paint(DIM_COLOR, &d.name))
            .collect(),
    };
    finish_list(w, names, opts);
    Ok(())
}

/// List every variable name in the file.
pub fn print_var_list(w: &mut dyn Write, ds: &Dataset, opts: &Opts) {
    let names: Vec<String> = ds
        .vars
        .iter()
        .map(|v| opts.paint(VAR_COLOR, &v.name))
        .collect();
    finish_list(w, names, opts);
}

/// Print dimension sizes of the file, or of one variable.
pub fn print_dim_sizes(
    w: &mut dyn Write,
    ds: &Dataset,
    var: Option<&str>,
    opts: &Opts,
) -> Result<(), NotFound> {
    let sizes: Vec<usize> = match var {
        Some(name) => var_or_missing(ds, name)?
            .dims
            .iter()
            .map(|&d| ds.dims[d].size)
            .collect(),
        None => ds.dims.iter().map(|d| d.size).collect(),
    };
    let strs: Vec<String> = sizes
        .iter()
        .map(|s| opts.paint(VALUE_COLOR, &s.to_string()))
        .collect();
    finish_list(w, strs, opts);
    Ok(())
}

/// Dump a variable's values through the buffered engine, one timestep
/// per read for multi-dimensional variables so one buffer allocation
/// serves the whole dump.
pub fn print_var_values(
    w: &mut dyn Write,
    ds: &mut Dataset,
    name: &str,
    opts: &Opts,
) -> Result<(), NotFound> {
    let vi = ds.var_index(name).ok_or_else(|| NotFound(name.to_string()))?;
    let ty = ds.vars[vi].ty;
    let ndims = ds.vars[vi].ndims();

    let mut buf = IoBuffer::new();
    let mut pieces: Vec<String> = Vec::new();
    if ndims > 1 {
        let steps = ds.dims[ds.vars[vi].dims[0]].size;
        let per_step: usize = ds.vars[vi].dims[1..]
            .iter()
            .map(|&d| ds.dims[d].size)
            .product();
        for step in 0..steps {
            let bytes = ds.read_timestep(vi, &mut buf, step);
            for i in 0..per_step {
                pieces.push(opts.paint(VALUE_COLOR, &format_value(ty, bytes, i)));
            }
        }
    } else {
        let bytes = ds.read_all(vi, &mut buf);
        let count = bytes.len() / ty.size().max(1);
        for i in 0..count {
            pieces.push(opts.paint(VALUE_COLOR, &format_value(ty, bytes, i)));
        }
    }
    finish_list(w, pieces, opts);
    Ok(())
}

fn finish_list(w: &mut dyn Write, items: Vec<String>, opts: &Opts) {
    let _ = writeln!(w, "{}", items.join(&opts.separator));
}

#[cfg(test)]
mod tests {
    use super::*;
    use sds_core::Sel;
    use sds_mem::{open, MemAtt, MemStore};

    fn sample() -> Dataset {
        let mut store = MemStore::netcdf();
        let t = store.add_dim("time", 2, true);
        let x = store.add_dim("x", 3, false);
        store.add_global_att(MemAtt::text("title", "dump test"));
        store.add_global_att(MemAtt::values("version", SdsType::I32, &[3i32]));
        let vals: Vec<f32> = vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5];
        let v = store.add_var(
            "temp",
            SdsType::F32,
            &[t, x],
            bytemuck::cast_slice(&vals).to_vec(),
        );
        store.add_var_att(v, MemAtt::text("units", "K"));
        let xs: Vec<f64> = vec![10.0, 20.0, 30.0];
        store.add_var("x", SdsType::F64, &[x], bytemuck::cast_slice(&xs).to_vec());
        open(&store.into_shared(), "sample.nc")
    }

    fn render(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn summary_names_everything() {
        let ds = sample();
        let text = render(|w| print_summary(w, &ds, &Opts::default()).unwrap());

        assert!(text.contains("sample.nc: NetCDF 4 format"));
        assert!(text.contains("2 global attributes"));
        assert!(text.contains("2 dimensions"));
        assert!(text.contains("2 variables"));
        assert!(text.contains("time = 2 (unlimited)"));
        assert!(text.contains("float temp[time=2][x=3]"));
        assert!(text.contains("double x[x=3] (coordinate)"));
        assert!(text.contains("title[9] = \"dump test\""));
        assert!(text.contains("units[1] = \"K\""));
        assert!(text.contains("version = 3"));
    }

    #[test]
    fn summary_without_global_attributes_says_so() {
        let mut store = MemStore::netcdf();
        store.add_dim("x", 1, false);
        let ds = open(&store.into_shared(), "empty.nc");
        let text = render(|w| print_summary(w, &ds, &Opts::default()).unwrap());
        assert!(text.contains(" - no global attributes -"));
    }

    #[test]
    fn color_codes_appear_only_when_enabled() {
        let ds = sample();
        let plain = render(|w| print_summary(w, &ds, &Opts::default()).unwrap());
        assert!(!plain.contains('\x1b'));

        let opts = Opts {
            color: true,
            ..Opts::default()
        };
        let colored = render(|w| print_summary(w, &ds, &opts).unwrap());
        assert!(colored.contains("\x1b[32m"));
        assert!(colored.contains(RESET));
    }

    #[test]
    fn attribute_listing_covers_file_and_variable_scopes() {
        let ds = sample();
        let opts = Opts::default();
        let text = render(|w| print_att_list(w, &ds, None, &opts).unwrap());
        assert_eq!(text, "title version\n");
        let text = render(|w| print_att_list(w, &ds, Some("temp"), &opts).unwrap());
        assert_eq!(text, "units\n");
    }

    #[test]
    fn missing_variables_are_reported() {
        let ds = sample();
        let mut out = Vec::new();
        let err = print_att_list(&mut out, &ds, Some("nope"), &Opts::default());
        assert!(matches!(err, Err(NotFound(n)) if n == "nope"));
    }

    #[test]
    fn dimension_listing_and_sizes() {
        let ds = sample();
        let opts = Opts::default();
        assert_eq!(
            render(|w| print_dim_list(w, &ds, None, &opts).unwrap()),
            "time x\n"
        );
        assert_eq!(
            render(|w| print_dim_list(w, &ds, Some("temp"), &opts).unwrap()),
            "time x\n"
        );
        assert_eq!(
            render(|w| print_dim_sizes(w, &ds, None, &opts).unwrap()),
            "2 3\n"
        );
        assert_eq!(
            render(|w| print_dim_sizes(w, &ds, Some("x"), &opts).unwrap()),
            "3\n"
        );
    }

    #[test]
    fn variable_listing_respects_single_column_mode() {
        let ds = sample();
        let opts = Opts {
            separator: "\n".to_string(),
            ..Opts::default()
        };
        assert_eq!(render(|w| print_var_list(w, &ds, &opts)), "temp\nx\n");
    }

    #[test]
    fn value_dump_walks_timesteps() {
        let mut ds = sample();
        let opts = Opts::default();
        let text = render(|w| print_var_values(w, &mut ds, "temp", &opts).unwrap());
        assert_eq!(text, "0.5 1.5 2.5 3.5 4.5 5.5\n");
    }

    #[test]
    fn value_dump_handles_rank_one_variables() {
        let mut ds = sample();
        let text =
            render(|w| print_var_values(w, &mut ds, "x", &Opts::default()).unwrap());
        assert_eq!(text, "10 20 30\n");
    }

    #[test]
    fn window_reads_feed_the_same_formatter() {
        // A spot check that a pinned read and the dump agree.
        let mut ds = sample();
        let vi = ds.var_index("temp").unwrap();
        let mut buf = IoBuffer::new();
        let bytes = ds.read_window(vi, &mut buf, &[Sel::At(1), Sel::At(2)]);
        assert_eq!(format_value(SdsType::F32, bytes, 0), "5.5");
    }
}
