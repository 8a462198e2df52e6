#[cfg(not(feature = "cli"))]
compile_error!("The `ibread` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use ibr::cli;
use ibr::cli::app::{Cli, ColorMode, Commands};
use ibr::IdbError;
use tracing_subscriber::EnvFilter;

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ibr={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, IdbError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| IdbError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Page {
            system_space_file,
            page,
            hex,
            json,
        } => cli::page::execute(
            &cli::page::PageOptions {
                files: system_space_file,
                page,
                hex,
                json,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::SystemSpaces {
            system_space_file,
            json,
        } => cli::system_spaces::execute(
            &cli::system_spaces::SystemSpacesOptions {
                files: system_space_file,
                json,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::Records {
            system_space_file,
            table,
            index,
            root,
            tablespace,
            skip_errors,
            json,
        } => cli::records::execute(
            &cli::records::RecordsOptions {
                files: system_space_file,
                table,
                index,
                root,
                tablespace,
                skip_errors,
                json,
                mmap: cli.mmap,
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "ibread", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result.and_then(|_| {
        writer
            .flush()
            .map_err(|e| IdbError::Io(format!("Cannot flush output: {}", e)))
    }) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
