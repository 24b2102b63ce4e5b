//! qblower - BASIC intrinsic lowering
//!
//! Command-line front end to the intrinsic catalog and the lowering
//! registry: list intrinsics, lower single calls, print unit preambles and
//! check a source file against a backend.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use qblower::compat::check_source;
use qblower::intrinsics::{self, Category, Intrinsic};
use qblower::lowering::{Backend, CallSite, LoweringRegistry, UnitRequirements};

/// qblower - lowers BASIC intrinsic calls for C#, C++, LLVM IR and CIL
#[derive(Parser, Debug)]
#[command(name = "qblower")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List intrinsics with their signatures and supporting backends
    List {
        /// Only intrinsics in this category (e.g. String, Networking)
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,

        /// Only intrinsics this backend supports
        #[arg(short, long)]
        backend: Option<Backend>,
    },

    /// Lower one intrinsic call and print the emitted fragment
    Emit {
        /// Target backend: managed, native, ir or bytecode
        backend: Backend,

        /// Intrinsic name, case-insensitive
        name: String,

        /// Already-lowered argument fragments
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        /// Result register for the IR backend
        #[arg(short, long, default_value = CallSite::DEFAULT_RESULT)]
        result: String,
    },

    /// Print the declarations and helpers a unit using NAMES needs
    Preamble {
        /// Target backend
        backend: Backend,

        /// Intrinsic names used by the unit
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Report every intrinsic call in FILE the backend cannot lower
    Check {
        /// Target backend
        backend: Backend,

        /// BASIC source file (.bas)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_name(s).ok_or_else(|| {
        let known: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category `{}` (expected one of {})", s, known.join(", "))
    })
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let registry = LoweringRegistry::standard();

    match args.command {
        Command::List { category, backend } => {
            list(&registry, category, backend);
            ExitCode::SUCCESS
        }
        Command::Emit {
            backend,
            name,
            args,
            result,
        } => {
            let call = CallSite::new(&args).with_result(&result);
            match registry.emit_call(backend, &name, &call) {
                Ok(code) => {
                    println!("{}", code);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Preamble { backend, names } => {
            let mut unit = UnitRequirements::new(backend);
            let mut failed = false;
            for name in &names {
                if let Err(e) = unit.note(&registry, name) {
                    eprintln!("Error: {}", e);
                    failed = true;
                }
            }
            print!("{}", unit.render_preamble());
            if unit.requires_runtime() {
                log::info!("unit links the BASIC runtime library");
            }
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Check { backend, input } => check(&registry, backend, &input),
    }
}

fn list(registry: &LoweringRegistry, category: Option<Category>, backend: Option<Backend>) {
    let names: Vec<&str> = match category {
        Some(category) => intrinsics::names_by_category(category).collect(),
        None => intrinsics::all_names().collect(),
    };

    let mut shown = 0;
    for name in names {
        if let Some(backend) = backend
            && !registry.supports(backend, name)
        {
            continue;
        }
        let Some(intrinsic) = Intrinsic::from_name(name) else {
            continue;
        };
        let backends: Vec<&str> = registry
            .backends_supporting(name)
            .iter()
            .map(Backend::as_str)
            .collect();
        println!(
            "{:<16} {:<60} [{}]",
            intrinsic.category().as_str(),
            intrinsic.descriptor().signature(),
            backends.join(", ")
        );
        shown += 1;
    }
    log::debug!("listed {} intrinsics", shown);
}

fn check(registry: &LoweringRegistry, backend: Backend, input: &Path) -> ExitCode {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let file = input.display().to_string();
    let diagnostics = check_source(registry, backend, &source);
    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic.render(&file, &source));
    }

    if diagnostics.is_empty() {
        log::info!(
            "{}: compatible with the {} backend ({})",
            file,
            backend,
            backend.target_language()
        );
        ExitCode::SUCCESS
    } else {
        log::info!("{}: {} incompatible call sites", file, diagnostics.len());
        ExitCode::FAILURE
    }
}
