//! Command-line argument parsing and help for presto.
//!
//! This module handles all CLI flag parsing used for config initialization
//! and help.
//!
//! When invoked with no args/flags, presto runs the interactive query loop.

use crate::config::Settings;

pub enum CliAction {
    RunApp,
    Exit,
}

pub fn handle_args() -> CliAction {
    let args: Vec<String> = std::env::args().collect();
    let config_path = Settings::default_path();

    if args.len() < 2 {
        return CliAction::RunApp;
    }

    if args.len() > 2 {
        eprintln!("Error: presto accepts only one argument at a time.");
        eprintln!("Usage: presto [OPTION]");
        return CliAction::Exit;
    }

    match args[1].as_str() {
        "--version" | "-v" => {
            print_version();
            CliAction::Exit
        }
        "-h" | "--help" => {
            print_help();
            CliAction::Exit
        }
        "--init" => {
            if let Err(e) = Settings::generate_default(&config_path) {
                eprintln!("Error: {}", e);
            }
            CliAction::Exit
        }
        arg => {
            eprintln!("Unknown argument: {}", arg);
            eprintln!("Try --help for available options");
            CliAction::Exit
        }
    }
}

fn print_version() {
    println!("presto {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"presto - a keystroke-driven application launcher and switcher core

USAGE:
  presto [OPTION]

Without options, presto loads its candidate sources and reads queries from
stdin, one per line, printing the routed result list for each. This is the
headless harness for the query engine; a host shell embeds the library for
the real launcher experience.

QUERY SYNTAX:
  text            substring filter over apps and shortcuts (top 8)
  :               list mounted drives
  C:\path         file explorer listing for a path
  @key words      scoped web search, {{word}} replaced by the trailing words

COMMANDS:
  :reload         re-read the JSON source lists
  :quit           exit

OPTIONS:
      --init              Generate a default configuration file
  -h, --help              Print help information
  -v, --version           Display the current installed version of presto

ENVIRONMENT:
  PRESTO_CONFIG           Override the default config path
  RUST_LOG                Log filter (tracing-subscriber env filter syntax)
"#
    );
}
