//! dockview-fmt - pretty-prints JSON log lines read from stdin
//!
//! Usage: `docker logs -f web 2>&1 | dockview-fmt`

use anyhow::Result;
use clap::Parser;
use dockview_fmt::{format_stream, LogFormatter};
use std::io::{self, ErrorKind};

#[derive(Parser)]
#[command(name = "dockview-fmt")]
#[command(author, version, about = "Format JSON container logs into readable lines", long_about = None)]
struct Cli {
    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let formatter = LogFormatter::new(!cli.no_color);

    let stdin = io::stdin();
    let stdout = io::stdout();
    match format_stream(stdin.lock(), stdout.lock(), &formatter) {
        // Viewer closed; nothing left to print to
        Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
        result => result.map_err(Into::into),
    }
}
