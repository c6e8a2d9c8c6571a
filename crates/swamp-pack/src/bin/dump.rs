//! `swamp-pack-dump` — inspecte un fichier `.swamp-pack`
//!
//! Prints the layout, per-kind counts and function records of a pack, or the
//! whole decoded contents as JSON.

#![forbid(unsafe_code)]

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use swamp_pack::{detect_format, read_delegated_pack, read_pack, ConstantKind, PackContents, PackFormat};

#[derive(Debug, Parser)]
#[command(name = "swamp-pack-dump", version, about = "Inspect a .swamp-pack file", long_about = None)]
struct Opt {
    /// Pack file to inspect
    input: PathBuf,

    /// Print the decoded contents as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn print_summary(contents: &PackContents) {
    println!("type info: {} bytes", contents.type_info.len());
    for kind in ConstantKind::WRITE_ORDER {
        println!("{kind:>22}: {}", contents.count(kind));
    }
    println!("{:>22}: {}", "functions", contents.functions.len());
    for (n, f) in contents.functions.iter().enumerate() {
        let constants: Vec<String> = f
            .constant_indices
            .iter()
            .map(|i| contents.constant_at(*i).map_or_else(|| i.to_string(), |c| format!("{i} {c}")))
            .collect();
        println!(
            "  [{n}] params:{} vars:{} opcodes:{} constants: [{}]",
            f.parameter_count,
            f.variable_count,
            f.opcodes.len(),
            constants.join(", ")
        );
    }
}

fn run(opt: &Opt) -> Result<()> {
    let bytes = fs::read(&opt.input).with_context(|| format!("lecture {}", opt.input.display()))?;
    let format = detect_format(&bytes).context("not a swamp pack")?;
    debug!(%format, size = bytes.len(), "detected");

    match format {
        PackFormat::Spk4 => {
            let contents = read_pack(&bytes)?;
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&contents)?);
            } else {
                println!("{format}");
                print_summary(&contents);
            }
        }
        PackFormat::Spk5 => {
            let blobs = read_delegated_pack(&bytes)?;
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&blobs)?);
            } else {
                println!("{format}");
                println!("type info: {} bytes", blobs.type_info.len());
                println!("constant memory: {} bytes", blobs.constant_memory.len());
                println!("ledger: {} bytes", blobs.ledger.len());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    init_tracing(opt.verbose);
    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
