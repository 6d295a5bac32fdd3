use crate::command::{Command, Context, ExitCode};
use crate::registry::Registry;
use anyhow::{Context as _, Result};
use argh::{EarlyExit, FromArgs};
use regex::RegexBuilder;
use std::env;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// One-line help text shown by `help`.
    fn about() -> &'static str;

    /// Executes the command using the provided context.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero
    /// for error.
    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode>;
}

/// Adapts a [`BuiltinCommand`] into the registry's [`Command`] contract.
///
/// Parses `args[1..]` with argh per invocation; parse failures print argh's
/// own output, execution errors are printed and become exit code 1. Neither
/// escapes to the dispatch loop.
pub(crate) struct Handler<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Handler<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand> Command for Handler<T> {
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<ExitCode> {
        let rest: Vec<&str> = args[1..].iter().map(String::as_str).collect();
        match T::from_args(&[args[0].as_str()], &rest) {
            Ok(cmd) => match cmd.execute(ctx) {
                Ok(code) => Ok(code),
                Err(e) => {
                    writeln!(ctx.out, "{e}")?;
                    Ok(1)
                }
            },
            Err(EarlyExit { output, status }) => {
                writeln!(ctx.out, "{}", output.trim_end())?;
                Ok(if status.is_err() { 1 } else { 0 })
            }
        }
    }

    fn describe(&self) -> &str {
        T::about()
    }
}

/// Install every direct-logic builtin into the registry.
pub(crate) fn install(registry: &mut Registry) {
    register::<Help>(registry);
    register::<Ls>(registry);
    register::<Ll>(registry);
    register::<Cd>(registry);
    register::<Pwd>(registry);
    register::<Cp>(registry);
    register::<Mv>(registry);
    register::<Rm>(registry);
    register::<Mkdir>(registry);
    register::<Echo>(registry);
    register::<Cat>(registry);
    register::<Grep>(registry);
    register::<Setenv>(registry);
    register::<Getenv>(registry);
    register::<Env>(registry);
}

fn register<T: BuiltinCommand + 'static>(registry: &mut Registry) {
    registry.register(T::name(), Box::new(Handler::<T>::default()));
}

#[derive(FromArgs)]
/// Display information about available commands.
pub struct Help {
    #[argh(positional)]
    /// command to describe; all commands are listed when omitted.
    pub command: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn about() -> &'static str {
        "Display information about available commands. Usage: help [command_name]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        match &self.command {
            None => {
                writeln!(ctx.out, "Available commands:")?;
                for (name, help) in ctx.registry.list() {
                    writeln!(ctx.out, "{name} - {help}")?;
                }
            }
            Some(name) => match ctx.registry.resolve(name) {
                Some(cmd) => writeln!(ctx.out, "{}", cmd.describe())?,
                None => writeln!(ctx.out, "No help available for \"{name}\"")?,
            },
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List files in the current or specified directory.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub directory: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn about() -> &'static str {
        "Lists files in the current or specified directory. Usage: ls [directory]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let dir = self.directory.as_deref().unwrap_or(".");
        let entries = fs::read_dir(dir).context("Unable to list directory")?;
        for entry in entries {
            let entry = entry?;
            writeln!(ctx.out, "{}", entry.file_name().to_string_lossy())?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List files in detail: permissions, links, owner ids, size and mtime.
pub struct Ll {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub directory: Option<String>,
}

impl BuiltinCommand for Ll {
    fn name() -> &'static str {
        "ll"
    }

    fn about() -> &'static str {
        "Lists all files in detail. Usage: ll [directory]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let dir = self.directory.as_deref().unwrap_or(".");
        let entries = fs::read_dir(dir).context("Unable to list directory")?;
        for entry in entries {
            let entry = entry?;
            // Entries whose metadata cannot be read are skipped, not fatal.
            let Ok(meta) = fs::metadata(entry.path()) else {
                continue;
            };
            write_detail(ctx.out, &meta, &entry.file_name().to_string_lossy())?;
        }
        Ok(0)
    }
}

#[cfg(unix)]
fn write_detail(out: &mut dyn Write, meta: &fs::Metadata, name: &str) -> Result<()> {
    use chrono::{DateTime, Local};
    use std::os::unix::fs::MetadataExt;

    let kind = if meta.is_dir() { 'd' } else { '-' };
    let mtime: DateTime<Local> = meta.modified()?.into();
    writeln!(
        out,
        "{kind}{} {} {} {} {} {} {name}",
        mode_string(meta.mode()),
        meta.nlink(),
        meta.uid(),
        meta.gid(),
        meta.len(),
        mtime.format("%b %e %H:%M"),
    )?;
    Ok(())
}

#[cfg(not(unix))]
fn write_detail(out: &mut dyn Write, meta: &fs::Metadata, name: &str) -> Result<()> {
    let kind = if meta.is_dir() { 'd' } else { '-' };
    writeln!(out, "{kind} {} {name}", meta.len())?;
    Ok(())
}

/// Render the nine user/group/other permission characters of a mode word.
fn mode_string(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    BITS.iter()
        .map(|&(bit, ch)| if mode & bit != 0 { ch } else { '-' })
        .collect()
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME
/// environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn about() -> &'static str {
        "Change the current directory. Usage: cd [directory]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                if let Some(home) = ctx.env.get_var("HOME") {
                    PathBuf::from(home)
                } else {
                    return Err(anyhow::anyhow!("cd: no target and HOME not set"));
                }
            }
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            ctx.env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        ctx.env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn about() -> &'static str {
        "Prints the current directory. Usage: pwd"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        writeln!(ctx.out, "{}", ctx.env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Copy a file.
pub struct Cp {
    #[argh(positional)]
    /// file to copy.
    pub source: String,

    #[argh(positional)]
    /// where to copy it.
    pub destination: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn about() -> &'static str {
        "Copies a file. Usage: cp [source] [destination]"
    }

    fn execute(self, _ctx: &mut Context<'_>) -> Result<ExitCode> {
        fs::copy(&self.source, &self.destination)
            .with_context(|| format!("cp: {}: cannot copy to {}", self.source, self.destination))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Move or rename a file.
pub struct Mv {
    #[argh(positional)]
    /// file to move.
    pub source: String,

    #[argh(positional)]
    /// where to move it.
    pub destination: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn about() -> &'static str {
        "Moves a file. Usage: mv [source] [destination]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        fs::rename(&self.source, &self.destination).context("Error moving file")?;
        writeln!(ctx.out, "File moved")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Delete a file.
pub struct Rm {
    #[argh(positional)]
    /// file to delete.
    pub file: String,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn about() -> &'static str {
        "Deletes a file. Usage: rm [file]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        fs::remove_file(&self.file).context("Error deleting file")?;
        writeln!(ctx.out, "File deleted successfully")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Create a directory.
pub struct Mkdir {
    #[argh(positional)]
    /// directory to create.
    pub directory: String,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn about() -> &'static str {
        "Creates a directory. Usage: mkdir [directory]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        fs::create_dir(&self.directory).context("Error creating directory")?;
        writeln!(ctx.out, "Directory created")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Write the arguments to standard output, separated by spaces.
/// By default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn about() -> &'static str {
        "Echoes text to the terminal. Usage: echo [text]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(ctx.out, "{s}")?;
        } else {
            writeln!(ctx.out, "{s}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print file contents to standard output.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn about() -> &'static str {
        "Displays the content of a file. Usage: cat [file]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        if self.files.is_empty() {
            writeln!(ctx.out, "Usage: cat [file]")?;
            return Ok(1);
        }
        for fname in &self.files {
            let mut f =
                fs::File::open(fname).map_err(|e| anyhow::anyhow!("cat: {fname}: {e}"))?;
            std::io::copy(&mut f, &mut *ctx.out)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print lines matching a pattern.
pub struct Grep {
    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries).
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions.
    pub ignore_case: bool,

    #[argh(positional)]
    /// the pattern to search for (a regular expression).
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search.
    pub files: Vec<String>,
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn about() -> &'static str {
        "Searches for a text pattern within a file. Usage: grep [pattern] [file]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        if self.files.is_empty() {
            writeln!(ctx.out, "Usage: grep [pattern] [file]")?;
            return Ok(1);
        }

        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("Invalid regex pattern: {pattern}"))?;

        let with_prefix = self.files.len() > 1;
        let mut exit_code = 0;
        for fname in &self.files {
            let file = match fs::File::open(fname) {
                Ok(f) => f,
                Err(e) => {
                    writeln!(ctx.out, "grep: {fname}: {e}")?;
                    exit_code = 1;
                    continue;
                }
            };
            for line in BufReader::new(file).lines() {
                let line = line?;
                if re.is_match(&line) {
                    if with_prefix {
                        writeln!(ctx.out, "{fname}:{line}")?;
                    } else {
                        writeln!(ctx.out, "{line}")?;
                    }
                }
            }
        }
        Ok(exit_code)
    }
}

#[derive(FromArgs)]
/// Set an environment variable for this session.
pub struct Setenv {
    #[argh(positional)]
    /// variable name.
    pub variable: String,

    #[argh(positional)]
    /// value to assign.
    pub value: String,
}

impl BuiltinCommand for Setenv {
    fn name() -> &'static str {
        "setenv"
    }

    fn about() -> &'static str {
        "Set an environment variable. Usage: setenv [variable] [value]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        writeln!(
            ctx.out,
            "Setting environment variable {} to {}",
            self.variable, self.value
        )?;
        ctx.env.set_var(self.variable, self.value);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the value of an environment variable.
pub struct Getenv {
    #[argh(positional)]
    /// variable name.
    pub variable: String,
}

impl BuiltinCommand for Getenv {
    fn name() -> &'static str {
        "getenv"
    }

    fn about() -> &'static str {
        "Get an environment variable. Usage: getenv [variable]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        match ctx.env.get_var(&self.variable) {
            Some(value) => writeln!(ctx.out, "{value}")?,
            None => writeln!(ctx.out, "Variable not set.")?,
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Display, set, or get environment variables.
pub struct Env {
    #[argh(positional, greedy)]
    /// use `set <var> <value>` to assign, a variable name to query, nothing to
    /// list everything.
    pub args: Vec<String>,
}

impl BuiltinCommand for Env {
    fn name() -> &'static str {
        "env"
    }

    fn about() -> &'static str {
        "Displays, sets, or gets environment variables. Usage: env [set var value | var]"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<ExitCode> {
        match self.args.as_slice() {
            [] => {
                let mut vars: Vec<(&String, &String)> = ctx.env.vars.iter().collect();
                vars.sort();
                for (k, v) in vars {
                    writeln!(ctx.out, "{k}={v}")?;
                }
            }
            [var] => {
                let value = ctx
                    .env
                    .get_var(var)
                    .unwrap_or_else(|| "Not set".to_string());
                writeln!(ctx.out, "{var}={value}")?;
            }
            [set, var, value] if set == "set" => {
                ctx.env.set_var(var.clone(), value.clone());
            }
            _ => {
                writeln!(ctx.out, "Usage: env [set var value | var]")?;
            }
        }
        Ok(0)
    }
}
