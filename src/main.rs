//! main.rs
//! Entry point for presto.
//!
//! Runs the query engine headless: candidate sources are loaded once, then
//! every stdin line is routed like a keystroke and the resulting rows are
//! printed. A real launcher embeds the library instead and wires in its own
//! window chrome, hotkeys and window enumerator.

use presto::app::{QueryRouter, ResultSnapshot};
use presto::config::{Settings, load_ignore_titles, load_macro_bindings};
use presto::core::{FileExplorerNavigator, LoadPhase, SourceAggregator, SystemShell};
use presto::utils::cli::{CliAction, handle_args};

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("\n[presto] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    if let CliAction::Exit = handle_args() {
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load();
    let aggregator = SourceAggregator::new(&settings);

    let phase = aggregator.ensure_loaded();
    if phase != LoadPhase::Loaded {
        eprintln!("[presto] candidate load ended in {:?}; starting empty", phase);
    }

    let mut router = QueryRouter::new(
        Arc::new(SystemShell),
        FileExplorerNavigator::new(settings.explorer_max_items()),
        load_macro_bindings(settings.lists_dir()),
        load_ignore_titles(settings.lists_dir()),
    );
    router.activate_links(aggregator.lists());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            ":quit" => break,
            ":reload" => {
                aggregator.reload_lists();
                router.activate_links(aggregator.lists());
                println!("lists reloaded");
            }
            query => print_snapshot(&router.set_query(query)),
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}

fn print_snapshot(snapshot: &ResultSnapshot) {
    println!("[{:?}] {} result(s)", snapshot.mode(), snapshot.rows().len());
    for (i, row) in snapshot.rows().iter().enumerate() {
        let marker = if snapshot.selected() == Some(i) { ">" } else { " " };
        if row.subtitle().is_empty() {
            println!("{marker} {}", row.title());
        } else {
            println!("{marker} {}  ({})", row.title(), row.subtitle());
        }
    }
}
