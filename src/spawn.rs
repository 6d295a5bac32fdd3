use crate::command::ExitCode;
use crate::env::Environment;
use anyhow::Result;
use std::process::ExitStatus;

/// Run a command line through the system shell and wait for it.
///
/// The child inherits the terminal's stdio, receives the environment map and
/// runs in the environment's current directory. This is the single spawning
/// primitive every delegating command goes through; the caller gets the exit
/// code and nothing else.
pub fn run_shell(command: &str, env: &Environment) -> Result<ExitCode> {
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .status()?;
    match status.code() {
        Some(x) => Ok(x),
        None => Ok(terminated_by_signal(status)),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
