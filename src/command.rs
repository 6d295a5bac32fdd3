use crate::env::Environment;
use crate::registry::Registry;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Everything a command invocation may touch besides its own arguments.
///
/// The registry reference lets commands like `help` enumerate their peers;
/// it is never mutated during an invocation. Output goes through `out` so
/// tests can capture it with an in-memory buffer.
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub env: &'a mut Environment,
    pub out: &'a mut dyn Write,
}

/// Object-safe trait for any command that can be dispatched by the shell.
///
/// `args` is the full whitespace-split token list of the invocation;
/// `args[0]` is the name the user typed (a command name or an alias) and is
/// never absent — dispatch does not resolve empty token lists.
pub trait Command {
    /// Executes the command against the given context.
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<ExitCode>;

    /// One-line help text shown by `help`.
    fn describe(&self) -> &str;
}
