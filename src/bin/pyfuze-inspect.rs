//! Inspect packaged executables

use clap::Parser;
use pyfuze::exit_codes::EXIT_PANIC;
use std::{panic, path::PathBuf, process};

#[derive(Parser, Debug)]
#[command(
    name = "pyfuze-inspect",
    version = pyfuze::version::VERSION,
    about = "Show the stub, control file and entries of a pyfuze package"
)]
struct Args {
    /// Packaged executable
    package: PathBuf,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {panic_info}");
        process::exit(EXIT_PANIC);
    }));

    let args = Args::parse();
    pyfuze::logger::JsonLogger::init_with_level(&args.log_level);
    process::exit(pyfuze::package::cli::show_info(&args.package, args.json));
}
