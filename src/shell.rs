//! The interactive read-evaluate loop.
//!
//! One thread, fully synchronous: each iteration renders a prompt from the
//! live working directory, blocks for a line, whitespace-tokenizes it and
//! dispatches the first token through the registry. A command that blocks
//! blocks the whole shell; there is no timeout and no concurrency.

use crate::command::Context;
use crate::env::Environment;
use crate::rc;
use crate::registry::Registry;
use rustyline::Editor;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Split a line on whitespace. No quoting, no escaping, no comment syntax:
/// a literal space always splits.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// What the loop does after evaluating one line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

/// The shell session: the command registry plus the environment every
/// command invocation sees.
pub struct Shell {
    registry: Registry,
    env: Environment,
}

impl Shell {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            env: Environment::new(),
        }
    }

    /// Source a startup file. Runs once, before [`Shell::repl`].
    pub fn source(&mut self, path: &Path) {
        rc::load(path, &mut self.registry, &mut self.env, &mut io::stdout());
    }

    /// Evaluate one input line and report whether the loop should go on.
    ///
    /// A literal `exit` first token terminates regardless of trailing
    /// arguments; an empty token list is a no-op. Everything else resolves
    /// through the registry, and both "not found" and a failing command are
    /// print-and-continue.
    pub(crate) fn eval_line(&mut self, line: &str, out: &mut dyn Write) -> Flow {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Flow::Continue;
        }
        if tokens[0] == "exit" {
            return Flow::Exit;
        }

        match self.registry.resolve(&tokens[0]) {
            Some(cmd) => {
                let mut ctx = Context {
                    registry: &self.registry,
                    env: &mut self.env,
                    out: &mut *out,
                };
                if let Err(e) = cmd.run(&tokens, &mut ctx) {
                    tracing::error!(command = %tokens[0], error = %e, "command failed");
                    let _ = writeln!(ctx.out, "Command error: {e}");
                }
            }
            None => {
                tracing::warn!(name = %tokens[0], "unknown command");
                let _ = writeln!(out, "Unknown command: {}", tokens[0]);
            }
        }
        Flow::Continue
    }

    /// The interactive loop. Returns after end-of-input or `exit`.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl: Editor<DshHelper, FileHistory> = Editor::new()?;
        rl.set_helper(Some(DshHelper {
            names: self.registry.names(),
        }));

        let history = dirs::home_dir().map(|h| h.join(".dsh_history"));
        if let Some(path) = &history {
            let _ = rl.load_history(path);
        }

        loop {
            // The prompt reflects live state, queried every iteration.
            let cwd = env::current_dir().unwrap_or_else(|_| self.env.current_dir.clone());
            let prompt = format!("{}: ", cwd.display());

            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    let mut out = io::stdout();
                    if self.eval_line(&line, &mut out) == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted!");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {err:?}");
                    break;
                }
            }
        }

        if let Some(path) = &history {
            let _ = rl.save_history(path);
        }
        Ok(())
    }
}

/// Tab completion over registered command and alias names, falling back to
/// entries of the current directory.
struct DshHelper {
    names: Vec<String>,
}

impl Completer for DshHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let start = line[..pos].rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let prefix = &line[start..pos];

        let mut candidates: Vec<String> = self
            .names
            .iter()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        if let Ok(entries) = fs::read_dir(".") {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(prefix) {
                    candidates.push(name);
                }
            }
        }
        Ok((start, candidates))
    }
}

impl Hinter for DshHelper {
    type Hint = String;
}

impl Highlighter for DshHelper {}

impl Validator for DshHelper {}

impl rustyline::Helper for DshHelper {}

#[cfg(test)]
mod tests {
    use super::{Flow, Shell, tokenize};
    use crate::default_registry;

    #[test]
    fn tokenize_splits_on_any_whitespace() {
        assert_eq!(tokenize("cd /tmp"), vec!["cd", "/tmp"]);
        assert_eq!(tokenize("  echo\t a  b "), vec!["echo", "a", "b"]);
    }

    #[test]
    fn tokenize_whitespace_only_yields_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("\t\t").is_empty());
    }

    #[test]
    fn blank_input_is_not_resolved() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        assert_eq!(shell.eval_line("   ", &mut out), Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn exit_terminates_even_with_trailing_arguments() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        assert_eq!(shell.eval_line("exit", &mut out), Flow::Exit);
        assert_eq!(shell.eval_line("exit now", &mut out), Flow::Exit);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_command_prints_diagnostic_and_continues() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        assert_eq!(shell.eval_line("frobnicate", &mut out), Flow::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Unknown command: frobnicate\n"
        );
    }

    #[test]
    fn dispatch_passes_the_full_token_list() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        assert_eq!(
            shell.eval_line("echo hello world", &mut out),
            Flow::Continue
        );
        assert_eq!(String::from_utf8(out).unwrap(), "hello world\n");
    }

    #[test]
    fn dispatch_mutates_the_session_environment() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        shell.eval_line("setenv DSH_SHELL_PROBE on", &mut out);
        assert_eq!(
            shell.env.get_var("DSH_SHELL_PROBE"),
            Some("on".to_string())
        );
    }

    #[test]
    fn aliases_resolve_through_dispatch() {
        let mut shell = Shell::new(default_registry());
        shell.registry.register_alias("say", "echo");
        let mut out = Vec::new();

        shell.eval_line("say hi", &mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "hi\n");
    }

    #[test]
    fn failing_command_does_not_stop_the_loop() {
        let mut shell = Shell::new(default_registry());
        let mut out = Vec::new();

        assert_eq!(
            shell.eval_line("cat /definitely/not/a/file", &mut out),
            Flow::Continue
        );
        assert!(String::from_utf8(out).unwrap().starts_with("cat:"));
    }
}
