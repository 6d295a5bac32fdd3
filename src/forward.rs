//! Commands that delegate to external programs.
//!
//! Each entry builds a command line from its tokens and hands it to
//! [`crate::spawn::run_shell`]; none of them contains logic beyond string
//! assembly and an arity check. They are data, not types: one [`Forward`]
//! command per table row.

use crate::command::{Command, Context, ExitCode};
use crate::registry::Registry;
use crate::spawn;
use anyhow::Result;
use std::io::Write;

/// A command whose behavior is building a string for the system shell.
pub(crate) struct Forward {
    help: &'static str,
    usage: &'static str,
    build: fn(&[String]) -> Option<String>,
}

impl Forward {
    /// The command line this invocation would run, or `None` when the
    /// arguments don't satisfy the entry's arity.
    fn command_line(&self, args: &[String]) -> Option<String> {
        (self.build)(args)
    }
}

impl Command for Forward {
    fn run(&self, args: &[String], ctx: &mut Context<'_>) -> Result<ExitCode> {
        match self.command_line(args) {
            Some(command) => {
                tracing::debug!(%command, "delegating to system shell");
                spawn::run_shell(&command, ctx.env)
            }
            None => {
                writeln!(ctx.out, "{}", self.usage)?;
                Ok(1)
            }
        }
    }

    fn describe(&self) -> &str {
        self.help
    }
}

/// Install every delegating command into the registry.
pub(crate) fn install(registry: &mut Registry) {
    for (name, cmd) in table() {
        registry.register(name, Box::new(cmd));
    }
}

fn entry(
    help: &'static str,
    usage: &'static str,
    build: fn(&[String]) -> Option<String>,
) -> Forward {
    Forward { help, usage, build }
}

#[rustfmt::skip]
fn table() -> Vec<(&'static str, Forward)> {
    vec![
        ("sysinfo", entry("Displays system information. Usage: sysinfo",
            "Usage: sysinfo", |_| Some("uname -a".into()))),
        ("top", entry("Displays real-time system resource usage. Usage: top",
            "Usage: top", |_| Some("top -b -n 1".into()))),
        ("du", entry("Analyzes disk space usage. Usage: du [path]",
            "Usage: du [path]",
            |args| Some(format!("du -sh {}", args.get(1).map(String::as_str).unwrap_or("."))))),
        ("ifconfig", entry("Lists all network interface configurations. Usage: ifconfig",
            "Usage: ifconfig", |_| Some("ifconfig".into()))),
        ("find", entry("Search for files matching a pattern. Usage: find [directory] [pattern]",
            "Usage: find [directory] [pattern]",
            |args| Some(format!("find {} -name \"{}\"", args.get(1)?, args.get(2)?)))),
        ("wget", entry("Download files from the internet. Usage: wget [url]",
            "Usage: wget [url]", |args| Some(format!("wget {}", args.get(1)?)))),
        ("hexdump", entry("Display file content in hexadecimal format. Usage: hexdump [file]",
            "Usage: hexdump [file]", |args| Some(format!("hexdump -C {}", args.get(1)?)))),
        ("ps", entry("Display currently running processes. Usage: ps",
            "Usage: ps", |_| Some("ps aux".into()))),
        ("netstat", entry("Show network statistics. Usage: netstat",
            "Usage: netstat", |_| Some("netstat -tuln".into()))),
        ("shutdown", entry("Shut down or reboot the system. Usage: shutdown [reboot]",
            "Usage: shutdown [reboot]",
            |args| Some(if args.get(1).is_some_and(|a| a == "reboot") {
                "reboot".into()
            } else {
                "shutdown now".into()
            }))),
        ("tail", entry("Follows the tail of a file. Usage: tail [file]",
            "Usage: tail [file]", |args| Some(format!("tail -f {}", args.get(1)?)))),
        ("tar", entry("Manages archives for backup and restoration. Usage: tar [c|x] [tarfile] [files...]",
            "Usage: tar [c|x] [tarfile] [files...]",
            |args| {
                if args.len() < 4 {
                    return None;
                }
                let mode = if args[1] == "c" { "-cf" } else { "-xf" };
                Some(format!("tar {mode} {} {}", args[2], args[3..].join(" ")))
            })),
        ("nano", entry("Open a file in the Nano editor. Usage: nano [file]",
            "Usage: nano [file]", |args| Some(format!("nano {}", args.get(1)?)))),
        ("http", entry("Starts a simple HTTP server. Usage: http [port]",
            "Usage: http [port]",
            |args| Some(format!("python -m http.server {}",
                args.get(1).map(String::as_str).unwrap_or("8000"))))),
        ("chmod", entry("Changes file permissions. Usage: chmod [permissions] [file]",
            "Usage: chmod [permissions] [file]",
            |args| Some(format!("chmod {} {}", args.get(1)?, args.get(2)?)))),
        ("chown", entry("Changes file owner and group. Usage: chown [owner][:group] [file]",
            "Usage: chown [owner][:group] [file]",
            |args| Some(format!("chown {} {}", args.get(1)?, args.get(2)?)))),
        ("sort", entry("Sorts the contents of a file. Usage: sort [file]",
            "Usage: sort [file]", |args| Some(format!("sort {}", args.get(1)?)))),
        ("uniq", entry("Filters or reports repeated lines in a file. Usage: uniq [file]",
            "Usage: uniq [file]", |args| Some(format!("uniq {}", args.get(1)?)))),
        ("wc", entry("Counts lines, words, and characters in a file. Usage: wc [file]",
            "Usage: wc [file]", |args| Some(format!("wc {}", args.get(1)?)))),
        ("df", entry("Reports disk space usage. Usage: df",
            "Usage: df", |_| Some("df -h".into()))),
        ("ln", entry("Creates a symbolic link. Usage: ln [target] [linkname]",
            "Usage: ln [target] [linkname]",
            |args| Some(format!("ln -s {} {}", args.get(1)?, args.get(2)?)))),
        ("chgrp", entry("Changes the group ownership of a file. Usage: chgrp [group] [file]",
            "Usage: chgrp [group] [file]",
            |args| Some(format!("chgrp {} {}", args.get(1)?, args.get(2)?)))),
        ("uptime", entry("Displays how long the system has been running. Usage: uptime",
            "Usage: uptime", |_| Some("uptime".into()))),
        ("free", entry("Displays the amount of free and used memory in the system. Usage: free",
            "Usage: free", |_| Some("free -h".into()))),
        ("who", entry("Displays who is logged on. Usage: who",
            "Usage: who", |_| Some("who".into()))),
        ("traceroute", entry("Traces the route packets take to a network host. Usage: traceroute [host]",
            "Usage: traceroute [host]",
            |args| Some(format!("traceroute {}", args.get(1)?)))),
        ("gzip", entry("Compress or decompress files using gzip. Usage: gzip [option] [file]",
            "Usage: gzip [option] [file]",
            |args| Some(format!("gzip {} {}", args.get(1)?, args.get(2)?)))),
        ("kill", entry("Send a signal to a process. Usage: kill [pid]",
            "Usage: kill [pid]", |args| Some(format!("kill {}", args.get(1)?)))),
        ("awk", entry("Program for pattern scanning and processing. Usage: awk [program] [file...]",
            "Usage: awk [program] [file...]",
            |args| Some(format!("awk {}", args[1..].join(" "))))),
        ("uname", entry("Prints system information. Usage: uname [option]",
            "Usage: uname [option]",
            |args| Some(match args.get(1) {
                Some(option) => format!("uname {option}"),
                None => "uname".into(),
            }))),
        ("less", entry("View file contents interactively. Usage: less [file]",
            "Usage: less [file]", |args| Some(format!("less {}", args.get(1)?)))),
        ("date", entry("Displays or sets the system date and time. Usage: date [\"YYYY-MM-DD HH:MM:SS\"]",
            "Usage: date [\"new date and time\"]",
            |args| match args.len() {
                1 => Some("date".into()),
                2 => Some(format!("date -s \"{}\"", args[1])),
                _ => None,
            })),
        ("mount", entry("Mounts filesystems. Usage: mount [source] [target]",
            "Usage: mount [source] [target]",
            |args| Some(format!("mount {} {}", args.get(1)?, args.get(2)?)))),
        ("umount", entry("Unmounts filesystems. Usage: umount [target]",
            "Usage: umount [target]", |args| Some(format!("umount {}", args.get(1)?)))),
        ("init", entry("Changes the runlevel of the system. Usage: init [runlevel]",
            "Usage: init [runlevel]", |args| Some(format!("init {}", args.get(1)?)))),
        ("last", entry("Shows a list of last logged in users. Usage: last",
            "Usage: last", |_| Some("last".into()))),
        ("nmap", entry("Network exploration tool and security scanner. Usage: nmap [options]",
            "Usage: nmap [options]",
            |args| Some(format!("nmap {}", args[1..].join(" "))))),
        ("psaux", entry("Detailed view of currently running processes. Usage: ps aux",
            "Usage: psaux", |_| Some("ps aux".into()))),
        ("tcpdump", entry("Command-line packet analyzer. Usage: tcpdump [options]",
            "Usage: tcpdump [options]",
            |args| Some(format!("tcpdump {}", args[1..].join(" "))))),
        ("touch", entry("Updates the access and modification times of a file. Usage: touch [file]",
            "Usage: touch [file]", |args| Some(format!("touch {}", args.get(1)?)))),
        ("man", entry("Displays user manual of any command. Usage: man [command]",
            "Usage: man [command]", |args| Some(format!("man {}", args.get(1)?)))),
        ("rsync", entry("Syncs files and directories between two locations. Usage: rsync [options] [source] [destination]",
            "Usage: rsync [options] [source] [destination]",
            |args| Some(format!("rsync {}", args[1..].join(" "))))),
        ("sql", entry("Executes SQL commands or scripts. Usage: sql [database] [SQL command]",
            "Usage: sql [database] [SQL command]",
            |args| Some(format!("sqlite3 {}", args[1..].join(" "))))),
        ("git", entry("Executes Git commands for version control. Usage: git [command]",
            "Usage: git [command]",
            |args| Some(format!("git {}", args[1..].join(" "))))),
        ("python", entry("Executes Python scripts or commands. Usage: python [script or command]",
            "Usage: python [script or command]",
            |args| Some(format!("python3 {}", args[1..].join(" "))))),
        ("envlist", entry("Lists all environment variables. Usage: envlist",
            "Usage: envlist", |_| Some("printenv".into()))),
        ("g++", entry("Compiles C++ source files. Usage: g++ [source file]",
            "Usage: g++ [source file]",
            |args| {
                let src = args.get(1)?;
                let stem = src.split('.').next().unwrap_or(src);
                Some(format!("g++ {src} -o {stem}"))
            })),
        ("encrypt", entry("Encrypts a file. Usage: encrypt [file] [key]",
            "Usage: encrypt [file] [key]",
            |args| Some(format!(
                "openssl enc -aes-256-cbc -salt -in {f} -out {f}.enc -k {k}",
                f = args.get(1)?,
                k = args.get(2)?,
            )))),
        ("diff", entry("Compares files line by line. Usage: diff [file1] [file2]",
            "Usage: diff [file1] [file2]",
            |args| Some(format!("diff {} {}", args.get(1)?, args.get(2)?)))),
        ("ifstat", entry("Displays network interface statistics. Usage: ifstat",
            "Usage: ifstat", |_| Some("ifstat".into()))),
        ("htop", entry("Provides detailed system performance information. Usage: htop",
            "Usage: htop", |_| Some("htop".into()))),
        ("vim", entry("Opens a file in Vim editor. Usage: vim [file]",
            "Usage: vim [file]", |args| Some(format!("vim {}", args.get(1)?)))),
        ("sed", entry("Performs text transformations. Usage: sed [expression] [file]",
            "Usage: sed [expression] [file]",
            |args| Some(format!("sed '{}' {}", args.get(1)?, args.get(2)?)))),
        ("login", entry("Logs in as a specified user. Usage: login [username]",
            "Usage: login [username]", |args| Some(format!("login {}", args.get(1)?)))),
        ("service", entry("Manages system services. Usage: service [service_name] [start|stop|restart]",
            "Usage: service [service_name] [start|stop|restart]",
            |args| Some(format!("service {} {}", args.get(1)?, args.get(2)?)))),
        ("mysql", entry("Executes MySQL commands. Usage: mysql [SQL commands]",
            "Usage: mysql [SQL commands]",
            |args| Some(format!("mysql -u user -p -e '{}'", args[1..].join(" "))))),
        ("cron", entry("Manages cron jobs. Usage: cron [filename]",
            "Usage: cron [filename]",
            |args| Some(match args.get(1) {
                Some(file) => format!("crontab {file}"),
                None => "crontab".into(),
            }))),
        ("bash", entry("Executes a bash script or command. Usage: bash [command]",
            "Usage: bash [command]",
            |args| Some(format!("bash {}", args[1..].join(" "))))),
        ("ping", entry("Checks network connectivity to a host. Usage: ping [host]",
            "Usage: ping [host]", |args| Some(format!("ping -c 4 {}", args.get(1)?)))),
        ("inotify", entry("Watches file system changes in real time. Usage: inotify [path]",
            "Usage: inotify [path]",
            |args| Some(match args.get(1) {
                Some(path) => format!("inotifywait -m {path}"),
                None => "inotifywait -m".into(),
            }))),
        ("play", entry("Plays audio files from the command line. Usage: play [audio file]",
            "Usage: play [audio file]",
            |args| Some(format!("ffplay -autoexit {}", args.get(1)?)))),
        ("exec", entry("Executes scripts or other programs. Usage: exec [command]",
            "Usage: exec [command]", |args| Some(args[1..].join(" ")))),
    ]
}

#[cfg(test)]
mod tests {
    use super::table;
    use std::collections::HashSet;

    fn build(name: &str, args: &[&str]) -> Option<String> {
        let (_, cmd) = table().into_iter().find(|(n, _)| *n == name).unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        cmd.command_line(&args)
    }

    #[test]
    fn table_names_are_unique() {
        let mut seen = HashSet::new();
        for (name, _) in table() {
            assert!(seen.insert(name), "duplicate forwarder name {name}");
        }
    }

    #[test]
    fn fixed_commands_ignore_arguments() {
        assert_eq!(build("ps", &["ps"]).unwrap(), "ps aux");
        assert_eq!(build("ps", &["ps", "extra"]).unwrap(), "ps aux");
        assert_eq!(build("sysinfo", &["sysinfo"]).unwrap(), "uname -a");
        assert_eq!(build("netstat", &["netstat"]).unwrap(), "netstat -tuln");
        assert_eq!(build("envlist", &["envlist"]).unwrap(), "printenv");
    }

    #[test]
    fn single_operand_commands_require_their_operand() {
        assert_eq!(build("ping", &["ping", "host"]).unwrap(), "ping -c 4 host");
        assert_eq!(build("ping", &["ping"]), None);
        assert_eq!(build("tail", &["tail", "log"]).unwrap(), "tail -f log");
        assert_eq!(
            build("hexdump", &["hexdump", "a.bin"]).unwrap(),
            "hexdump -C a.bin"
        );
        assert_eq!(
            build("play", &["play", "a.ogg"]).unwrap(),
            "ffplay -autoexit a.ogg"
        );
    }

    #[test]
    fn optional_operand_commands_have_defaults() {
        assert_eq!(build("du", &["du"]).unwrap(), "du -sh .");
        assert_eq!(build("du", &["du", "/var"]).unwrap(), "du -sh /var");
        assert_eq!(
            build("http", &["http"]).unwrap(),
            "python -m http.server 8000"
        );
        assert_eq!(
            build("http", &["http", "9090"]).unwrap(),
            "python -m http.server 9090"
        );
        assert_eq!(build("uname", &["uname"]).unwrap(), "uname");
        assert_eq!(build("uname", &["uname", "-r"]).unwrap(), "uname -r");
        assert_eq!(build("cron", &["cron"]).unwrap(), "crontab");
        assert_eq!(build("inotify", &["inotify"]).unwrap(), "inotifywait -m");
    }

    #[test]
    fn two_operand_commands() {
        assert_eq!(
            build("chmod", &["chmod", "755", "f"]).unwrap(),
            "chmod 755 f"
        );
        assert_eq!(build("chmod", &["chmod", "755"]), None);
        assert_eq!(build("ln", &["ln", "a", "b"]).unwrap(), "ln -s a b");
        assert_eq!(
            build("sed", &["sed", "s/a/b/", "f"]).unwrap(),
            "sed 's/a/b/' f"
        );
        assert_eq!(
            build("find", &["find", "/tmp", "*.c"]).unwrap(),
            "find /tmp -name \"*.c\""
        );
        assert_eq!(
            build("encrypt", &["encrypt", "f.txt", "secret"]).unwrap(),
            "openssl enc -aes-256-cbc -salt -in f.txt -out f.txt.enc -k secret"
        );
    }

    #[test]
    fn rest_commands_join_everything() {
        assert_eq!(
            build("git", &["git", "status", "-s"]).unwrap(),
            "git status -s"
        );
        assert_eq!(build("python", &["python"]).unwrap(), "python3 ");
        assert_eq!(build("sql", &["sql", "db", "select 1"]).unwrap(), "sqlite3 db select 1");
        assert_eq!(
            build("mysql", &["mysql", "show", "tables"]).unwrap(),
            "mysql -u user -p -e 'show tables'"
        );
        assert_eq!(build("exec", &["exec", "uptime"]).unwrap(), "uptime");
        assert_eq!(build("exec", &["exec"]).unwrap(), "");
    }

    #[test]
    fn shutdown_selects_reboot() {
        assert_eq!(build("shutdown", &["shutdown"]).unwrap(), "shutdown now");
        assert_eq!(
            build("shutdown", &["shutdown", "reboot"]).unwrap(),
            "reboot"
        );
    }

    #[test]
    fn date_with_operand_quotes_it() {
        assert_eq!(build("date", &["date"]).unwrap(), "date");
        assert_eq!(
            build("date", &["date", "2020-01-01"]).unwrap(),
            "date -s \"2020-01-01\""
        );
        assert_eq!(build("date", &["date", "a", "b"]), None);
    }

    #[test]
    fn tar_selects_mode_flag() {
        assert_eq!(
            build("tar", &["tar", "c", "a.tar", "f1", "f2"]).unwrap(),
            "tar -cf a.tar f1 f2"
        );
        assert_eq!(
            build("tar", &["tar", "x", "a.tar", "f1"]).unwrap(),
            "tar -xf a.tar f1"
        );
        assert_eq!(build("tar", &["tar", "c", "a.tar"]), None);
    }

    #[test]
    fn gpp_derives_output_name() {
        assert_eq!(
            build("g++", &["g++", "main.cpp"]).unwrap(),
            "g++ main.cpp -o main"
        );
        assert_eq!(build("g++", &["g++", "prog"]).unwrap(), "g++ prog -o prog");
        assert_eq!(build("g++", &["g++"]), None);
    }

    #[test]
    fn forwarders_do_not_shadow_builtins() {
        let registry = crate::default_registry();
        // cat is a direct builtin; a forwarder under the same name would
        // have replaced its help text.
        assert_eq!(
            registry.resolve("cat").unwrap().describe(),
            "Displays the content of a file. Usage: cat [file]"
        );
        assert!(registry.list().count() >= 75);
    }
}
