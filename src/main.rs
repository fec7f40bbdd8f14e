// Standard Imports
use std::path::PathBuf;

use clap::Parser;
use log::{error, info, LevelFilter};

use rainbow::{Config, Rainbow, SyntaxTree, Verdict};

/// Command Line interface struct
/// Describes possible arguments using the clap library
#[derive(Parser)]
#[clap(about = "rainbow - arbitrary function coloring for c++!")]
struct CheckerCLIOptions {
    /// Path to a JSON syntax tree dump of one C++ translation unit
    #[clap(parse(from_os_str))]
    ast: PathBuf,

    /// Path to the checker config (colors, patterns, prefix, executor)
    #[clap(parse(from_os_str))]
    config: PathBuf,

    // Flags

    /// Increase verbosity (can be supplied multiple times)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,

    /// Suppress output
    #[clap(short, long, action, conflicts_with = "verbose")]
    quiet: bool,
}

impl CheckerCLIOptions {
    /// Map the verbosity flags onto a log filter. The default surfaces
    /// errors only; each -v reveals one more level.
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Off;
        }
        match self.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

fn main() {
    // Parse Command line arguments
    let cli_args = CheckerCLIOptions::parse();
    env_logger::Builder::new()
        .filter_level(cli_args.log_level())
        .init();

    let config = match Config::from_json_file(&cli_args.config) {
        Ok(config) => config,
        Err(why) => {
            error!("{}", why);
            std::process::exit(exitcode::CONFIG);
        }
    };

    let tree = match SyntaxTree::from_file(&cli_args.ast) {
        Ok(tree) => tree,
        Err(why) => {
            error!("{}", why);
            std::process::exit(exitcode::DATAERR);
        }
    };

    let rainbow = Rainbow::new(&tree, config);
    match rainbow.run() {
        Ok(verdict) => {
            let invalid = match verdict {
                Verdict::Invalid => "true",
                Verdict::Valid => "false",
                Verdict::Unknown => "UNKNOWN",
            };
            info!("program is invalid: {}", invalid);
            std::process::exit(verdict.exit_code());
        }
        Err(why) => {
            error!("{}", why);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}
