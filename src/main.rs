use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use genquery2_sql::compiler::{self, CompileOptions};

/// genquery2c - compiles a GenQuery source string into parameterized SQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GenQuery source text. Reads from stdin instead when omitted.
    source: Option<String>,

    /// User name bound into the permission predicate.
    #[arg(long, default_value = "")]
    user: String,

    /// Bypass the per-user permission predicate and use the admin threshold.
    #[arg(long)]
    admin_mode: bool,

    /// Print the bound values alongside the SQL.
    #[arg(long)]
    show_bindings: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let source = match cli.source {
        Some(s) => s,
        None => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("ERROR: failed to read source from stdin: {e}");
                return ExitCode::FAILURE;
            }
            buf
        }
    };

    let options = CompileOptions {
        invoking_user: cli.user,
        admin_mode: cli.admin_mode,
    };

    match compiler::compile(&source, &options) {
        Ok(result) => {
            println!("{}", result.sql);
            if cli.show_bindings {
                for (i, value) in result.bound_values.iter().enumerate() {
                    println!("${}: {value}", i + 1);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}
