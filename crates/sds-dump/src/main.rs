//! sds-dump: print part or all of a supported scientific data file.
//!
//! Exit codes: 0 on success, -1 for usage errors, -2 for unreadable or
//! unrecognized files, -3 when a named variable does not exist.

mod output;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use sds_core::open_any;

use output::{
    print_att_list, print_dim_list, print_dim_sizes, print_summary, print_var_list,
    print_var_values, NotFound, Opts,
};

/// Dump part or all of INFILE, producing a colorful summary of its
/// contents by default.
#[derive(Parser, Debug)]
#[command(name = "sds-dump", version)]
struct Cli {
    /// The data file to inspect.
    infile: PathBuf,

    /// Output values in a single column.
    #[arg(short = '1', long)]
    single_column: bool,

    /// Never color the output.
    #[arg(short = 'g', long = "no-color", overrides_with = "color")]
    no_color: bool,

    /// Always color the output (default: only when stdout is a terminal).
    #[arg(short = 'G', long = "color")]
    color: bool,

    /// List the attributes of the file, or of VAR if given.
    #[arg(short = 'a', long = "list-atts", value_name = "VAR", num_args = 0..=1, require_equals = true)]
    list_atts: Option<Option<String>>,

    /// List the dimensions of the file, or of VAR if given.
    #[arg(short = 'd', long = "list-dims", value_name = "VAR", num_args = 0..=1, require_equals = true)]
    list_dims: Option<Option<String>>,

    /// List the variables in the file.
    #[arg(short = 'l', long = "list-vars")]
    list_vars: bool,

    /// Print dimension sizes for the whole file, or for VAR if given.
    #[arg(short = 's', long = "dim-sizes", value_name = "VAR", num_args = 0..=1, require_equals = true)]
    dim_sizes: Option<Option<String>>,

    /// Print the values of variable VAR.
    #[arg(short = 'v', long = "var", value_name = "VAR")]
    var: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => -1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let color = if cli.no_color {
        false
    } else if cli.color {
        true
    } else {
        io::stdout().is_terminal()
    };
    let opts = Opts {
        color,
        separator: if cli.single_column { "\n" } else { " " }.to_string(),
    };

    let infile = cli.infile.display().to_string();
    let mut ds = match open_any(&cli.infile) {
        Some(ds) => ds,
        None => {
            eprintln!("{infile}: unrecognized or unsupported file");
            process::exit(-2);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result: Result<(), NotFound> = if let Some(var) = &cli.list_atts {
        print_att_list(&mut out, &ds, var.as_deref(), &opts)
    } else if let Some(var) = &cli.list_dims {
        print_dim_list(&mut out, &ds, var.as_deref(), &opts)
    } else if cli.list_vars {
        print_var_list(&mut out, &ds, &opts);
        Ok(())
    } else if let Some(var) = &cli.dim_sizes {
        print_dim_sizes(&mut out, &ds, var.as_deref(), &opts)
    } else if let Some(name) = &cli.var {
        print_var_values(&mut out, &mut ds, name, &opts)
    } else {
        print_summary(&mut out, &ds, &opts)
            .map_err(|e| die_io(&infile, e))
    };
    let _ = out.flush();
    drop(out);

    if let Err(NotFound(name)) = result {
        eprintln!("{infile}: no variable '{name}' found");
        process::exit(-3);
    }

    ds.close();
}

fn die_io(path: &str, e: io::Error) -> NotFound {
    // Failing to write to stdout is its own kind of fatal.
    eprintln!("{path}: error writing output: {e}");
    process::exit(-2);
}
