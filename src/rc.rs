//! Startup-script loader.
//!
//! Processes the per-user configuration file once, before the interactive
//! loop starts. Two line grammars: `alias <name> ... "<command-text>"` and
//! `<command-name> [args...]`, the latter executed eagerly with all its side
//! effects. Every failure mode is print-and-continue; a missing file is not
//! an error.

use crate::command::Context;
use crate::env::Environment;
use crate::registry::Registry;
use crate::shell::tokenize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Source a startup file into the registry and environment.
pub fn load(path: &Path, registry: &mut Registry, env: &mut Environment, out: &mut dyn Write) {
    let Ok(text) = fs::read_to_string(path) else {
        return;
    };
    tracing::info!(path = %path.display(), "loading startup script");

    for line in text.lines() {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] == "alias" && tokens.len() >= 3 {
            let target = quoted_target(line);
            tracing::info!(alias = %tokens[1], %target, "alias registered");
            registry.register_alias(tokens[1].clone(), target);
            continue;
        }

        match registry.resolve(&tokens[0]) {
            Some(cmd) => {
                let mut ctx = Context {
                    registry: &*registry,
                    env: &mut *env,
                    out: &mut *out,
                };
                if let Err(e) = cmd.run(&tokens, &mut ctx) {
                    tracing::error!(command = %tokens[0], error = %e, "startup command failed");
                    let _ = writeln!(ctx.out, "Command error: {e}");
                }
            }
            None => {
                tracing::warn!(name = %tokens[0], "unknown name in startup script");
                let _ = writeln!(out, "Unknown command or alias: {}", tokens[0]);
            }
        }
    }
}

/// The alias target: the raw substring strictly between the first and last
/// double quote on the line.
///
/// Fewer than two quotes yields an empty target; the caller registers it
/// anyway (malformed declarations are accepted, not rejected).
fn quoted_target(line: &str) -> String {
    match (line.find('"'), line.rfind('"')) {
        (Some(first), Some(last)) if first < last => line[first + 1..last].to_string(),
        _ => String::new(),
    }
}
