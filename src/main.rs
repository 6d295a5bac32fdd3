use anyhow::Result;
use dsh::{Shell, default_registry};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let mut shell = Shell::new(default_registry());

    println!("Welcome to dsh");
    if let Some(rc_path) = dirs::home_dir().map(|h| h.join(".dshrc")) {
        shell.source(&rc_path);
    }
    shell.repl()?;
    tracing::info!("session ended");
    Ok(())
}

/// Append session records to `~/.dsh_log.txt`.
///
/// Any failure to set this up leaves logging disabled; the shell itself is
/// unaffected.
fn init_logging() {
    let Some(path) = dirs::home_dir().map(|h| h.join(".dsh_log.txt")) else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    tracing::info!("dsh session started");
}
