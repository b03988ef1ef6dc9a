//! nc2code: inspect a data file's metadata and emit code that reads it.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use sds_core::open_any;

/// Inspect a data file's metadata and emit code to read that file.
#[derive(Parser, Debug)]
#[command(name = "nc2code", version)]
struct Cli {
    /// The data file to inspect.
    infile: PathBuf,

    /// Write the code to FILE instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also generate code reading every attribute.
    #[arg(short = 'a', long = "attributes")]
    attributes: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let infile = cli.infile.display().to_string();
    let mut ds = match open_any(&cli.infile) {
        Some(ds) => ds,
        None => {
            eprintln!("{infile}: unrecognized or unsupported file");
            process::exit(-2);
        }
    };

    match &cli.output {
        Some(path) => {
            let mut out = File::create(path)
                .with_context(|| format!("opening output file '{}'", path.display()))?;
            sds_codegen::generate_f90(&mut ds, cli.attributes, &mut out)?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            sds_codegen::generate_f90(&mut ds, cli.attributes, &mut out)?;
            out.flush()?;
        }
    }

    ds.close();
    Ok(())
}
