//! pyfuze builder binary

use clap::Parser;
use pyfuze::exit_codes::{EXIT_PANIC, EXIT_SUCCESS};
use pyfuze::package::defaults::{
    DEBUG_ENV, DEFAULT_ENTRY, DEFAULT_OUT_DIR, DEFAULT_UV_INSTALL_SCRIPT_UNIX,
    DEFAULT_UV_INSTALL_SCRIPT_WINDOWS,
};
use pyfuze::package::selection::SelectionKind;
use pyfuze::utils::is_env_true;
use pyfuze::{BuildOptions, build_package};
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = pyfuze::version::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "pyfuze",
    version = VERSION,
    about = "Package Python scripts with dependencies into a single executable"
)]
struct Args {
    /// Python script or project directory
    python_project: PathBuf,

    /// Output file name [default: <project stem>.com]
    #[arg(long)]
    output_name: Option<String>,

    /// Directory the executable is written to
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Unpack directory on the target [default: /tmp/<project stem>]
    #[arg(long)]
    unzip_path: Option<String>,

    /// Python version written to .python-version
    #[arg(long = "python")]
    python_version: Option<String>,

    /// Requirements file or comma-separated list
    #[arg(long = "reqs")]
    requirements: Option<String>,

    /// pyproject.toml to embed
    #[arg(long)]
    pyproject: Option<PathBuf>,

    /// uv.lock to embed
    #[arg(long)]
    uv_lock: Option<PathBuf>,

    /// Entry script for project directories
    #[arg(long, default_value = DEFAULT_ENTRY)]
    entry: String,

    /// Keep the windowed subsystem (no console window)
    #[arg(long)]
    win_gui: bool,

    /// Extra file or directory, as SRC or SRC::DEST (repeatable)
    #[arg(long = "include")]
    includes: Vec<String>,

    /// Path relative to the project to leave out, globs allowed (repeatable)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Runtime environment variable KEY=VALUE (repeatable)
    #[arg(long)]
    env: Vec<String>,

    /// uv install script used on Windows
    #[arg(long, default_value = DEFAULT_UV_INSTALL_SCRIPT_WINDOWS)]
    uv_install_script_windows: String,

    /// uv install script used on Linux and macOS
    #[arg(long, default_value = DEFAULT_UV_INSTALL_SCRIPT_UNIX)]
    uv_install_script_unix: String,

    /// Which project files are copied
    #[arg(long, value_enum, default_value_t = SelectionKind::CopyAll)]
    selection: SelectionKind,

    /// Launcher stub [default: $PYFUZE_STUB or pyfuze.com next to this binary]
    #[arg(long)]
    stub: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, json[:level])
    #[arg(long)]
    log_level: Option<String>,

    /// Print full failure details
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    // Set up panic handler to return specific exit code
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {panic_info}");
        process::exit(EXIT_PANIC);
    }));

    let result = panic::catch_unwind(run);

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in pyfuze");
            process::exit(EXIT_PANIC);
        }
    }
}

fn run() -> i32 {
    // Handle --version before clap
    if env::args().nth(1).as_deref() == Some("--version") {
        println!("pyfuze {}", pyfuze::version::full_version());
        return EXIT_SUCCESS;
    }

    let args = Args::parse();

    match args.log_level {
        Some(ref level) => pyfuze::logger::JsonLogger::init_with_level(level),
        None => pyfuze::logger::JsonLogger::init(),
    };

    let debug = args.debug || is_env_true(DEBUG_ENV);
    let options = BuildOptions {
        project: args.python_project,
        output_name: args.output_name,
        out_dir: args.out_dir,
        unzip_path: args.unzip_path,
        python_version: args.python_version,
        requirements: args.requirements,
        pyproject: args.pyproject,
        uv_lock: args.uv_lock,
        entry: args.entry,
        win_gui: args.win_gui,
        includes: args.includes,
        excludes: args.excludes,
        env: args.env,
        uv_install_script_windows: args.uv_install_script_windows,
        uv_install_script_unix: args.uv_install_script_unix,
        selection: args.selection,
        stub: args.stub,
        debug,
    };

    match build_package(&options) {
        Ok(report) => {
            println!("Successfully packaged: {}", report.output.display());
            EXIT_SUCCESS
        }
        Err(failure) => {
            eprintln!("Error: {failure}");
            if options.debug {
                eprintln!("{failure:#?}");
            }
            failure.exit_code()
        }
    }
}
