//! Command line entry point of epub-converter

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use epub_converter::{convert::ScriptConverter, error::EpubError, pipeline::convert_archive};

/// Convert the text of an EPUB file between Chinese script variants.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The EPUB file to convert.
    #[arg(short, long)]
    input: PathBuf,

    /// The path of the converted EPUB file.
    #[arg(short, long)]
    output: PathBuf,

    /// Conversion ruleset: t2s (traditional-to-simplified) or s2t (simplified-to-traditional).
    #[arg(short, long, default_value = "t2s")]
    ruleset: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {}", err);
        return ExitCode::FAILURE;
    }

    println!(
        "Converted \"{}\" into \"{}\"",
        args.input.display(),
        args.output.display()
    );
    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<(), EpubError> {
    let converter = ScriptConverter::from_name(&args.ruleset)?;
    convert_archive(&args.input, &args.output, &converter)
}
