// src/stages/command.rs

//! Shell command execution for external compilers.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

/// Run a tool command template and return its stdout.
///
/// - `{src}` in `template` is replaced with the shell-quoted `src` path.
/// - `stdin`, when given, is piped into the process.
/// - The command runs through `sh -c` (`cmd /C` on Windows) in `cwd`.
///
/// A non-zero exit status is an error carrying the command's stderr.
pub fn run_tool(template: &str, src: Option<&Path>, stdin: Option<&str>, cwd: &Path) -> Result<String> {
    let line = match src {
        Some(path) => template.replace("{src}", &shell_quote(&path.to_string_lossy())),
        None => template.to_string(),
    };

    info!(cmd = %line, "running tool");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&line);
        c
    };

    cmd.current_dir(cwd)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning tool command '{line}'"))?;

    // Feed stdin from a separate thread so a tool that writes a lot before
    // draining its input cannot deadlock against us.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(std::thread::spawn(move || pipe.write_all(input.as_bytes())))
        }
        _ => None,
    };

    let output = child
        .wait_with_output()
        .with_context(|| format!("waiting for tool command '{line}'"))?;

    let write_result = match writer {
        Some(writer) => writer
            .join()
            .map_err(|_| anyhow!("stdin writer for '{line}' panicked"))?,
        None => Ok(()),
    };

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        bail!(
            "tool command '{}' exited with {}: {}",
            line,
            output.status.code().map_or("signal".to_string(), |c| c.to_string()),
            stderr.trim()
        );
    }
    // A tool that succeeds without draining its stdin closes the pipe early.
    match write_result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(cmd = %line, "tool exited before reading all of its input");
        }
        other => other.with_context(|| format!("writing stdin of tool command '{line}'"))?,
    }
    if !stderr.trim().is_empty() {
        debug!(cmd = %line, "stderr: {}", stderr.trim());
    }

    String::from_utf8(output.stdout).with_context(|| format!("tool command '{line}' produced non-UTF-8 output"))
}

/// Quote `s` for POSIX shells.
fn shell_quote(s: &str) -> String {
    if cfg!(windows) {
        return format!("\"{s}\"");
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
