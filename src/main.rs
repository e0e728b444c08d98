//! Valflow CLI - Command Line Interface
//!
//! Usage:
//!   valflow check <file.php>   - Analyze a file and print the scope report
//!   valflow <file.php>         - Shortcut for check

use std::env;
use std::path::Path;
use std::process;

use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use valflow::error::FlowError;
use valflow::report;
use valflow::semantic::{Analysis, Analyzer};
use valflow::source::{is_php_file, load_program};

fn main() {
    setup_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "check" => {
            if args.len() < 3 {
                eprintln!("{}", "Error: Missing file argument".red());
                eprintln!("Usage: valflow check <file.php>");
                process::exit(1);
            }
            check_file(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!(
                "{}",
                format!("Valflow v{}", env!("CARGO_PKG_VERSION")).cyan().bold()
            );
        }
        _ => {
            // Convenience: `valflow file.php`
            if is_php_file(Path::new(command)) {
                check_file(command);
            } else {
                eprintln!("{}: Unknown command '{}'", "Error".red(), command);
                print_usage();
                process::exit(1);
            }
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (errors only by default)
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn print_usage() {
    println!(
        "{}",
        format!("Valflow v{}", env!("CARGO_PKG_VERSION")).cyan().bold()
    );
    println!();
    println!("{}", "Usage:".yellow().bold());
    println!(
        "  {} {}   Analyze values and types",
        "valflow check".green(),
        "<file>".white()
    );
    println!(
        "  {} {}         Shortcut for check",
        "valflow".green(),
        "<file>".white()
    );
    println!("  {}           Show this help", "valflow help".green());
    println!("  {}        Show version", "valflow version".green());
    println!();
    println!("Supported file extensions: {}", ".php".cyan());
    println!("Set {} to see analysis logs", "RUST_LOG=debug".cyan());
}

fn check_file(path: &str) {
    match check_file_internal(path) {
        Ok(analysis) => {
            print!("{}", report::render(&analysis));
            println!();

            if analysis.diagnostics.is_empty() {
                println!("{}", format!("✓ Analyzed '{}'", path).green().bold());
            } else {
                println!(
                    "{}",
                    format!(
                        "✓ Analyzed '{}' with {} unresolved argument(s)",
                        path,
                        analysis.diagnostics.len()
                    )
                    .yellow()
                    .bold()
                );
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn check_file_internal(path: &str) -> Result<Analysis, FlowError> {
    let program = load_program(path)?;
    Analyzer::new().analyze(&program)
}
