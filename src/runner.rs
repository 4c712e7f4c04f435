//! Running the configured Jest command and capturing its output.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use tracing::{info, warn};

/// Output of one test command invocation.
#[derive(Debug, Default)]
pub struct TestRun {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the command could not be started or waited on.
    pub status: Option<ExitStatus>,
}

/// Append the Jest options needed for reporting to the configured command.
///
/// `npm` scripts need a `--` separator so the options reach Jest. Paths and
/// refs are quoted for `sh`.
#[must_use]
pub fn jest_command(
    base: &str,
    results_file: &Path,
    coverage: bool,
    changed_since: Option<&str>,
) -> String {
    let mut options = vec![
        "--ci".to_string(),
        "--testLocationInResults".to_string(),
        "--json".to_string(),
    ];
    if coverage {
        options.push("--coverage".to_string());
    }
    if let Some(base_ref) = changed_since {
        options.push(format!("--changedSince={}", shell_quote(base_ref)));
    }
    options.push(format!(
        "--outputFile={}",
        shell_quote(&results_file.to_string_lossy())
    ));

    let base = base.trim();
    let separator = if base == "npm" || base.starts_with("npm ") {
        " -- "
    } else {
        " "
    };
    format!("{base}{separator}{}", options.join(" "))
}

/// Single-quote `value` for `sh`.
fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Run `command` through the shell in `cwd`, echoing and capturing both
/// output streams.
///
/// Failures to start or wait on the command are logged, not returned.
pub fn run(command: &str, cwd: &Path) -> TestRun {
    info!("Running `{command}` in {}", cwd.display());

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to start test command: {e}");
            return TestRun::default();
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (stdout, stderr) = thread::scope(|scope| {
        let out = scope.spawn(|| stdout.map(|r| capture(r, std::io::stdout())).unwrap_or_default());
        let err = scope.spawn(|| stderr.map(|r| capture(r, std::io::stderr())).unwrap_or_default());
        (
            out.join().unwrap_or_default(),
            err.join().unwrap_or_default(),
        )
    });

    let status = match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Failed to wait for test command: {e}");
            None
        }
    };

    TestRun {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        status,
    }
}

/// Copy everything from `reader` to `echo`, keeping a copy.
fn capture(mut reader: impl Read, mut echo: impl Write) -> Vec<u8> {
    let mut captured = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                captured.extend_from_slice(&buf[..n]);
                // Echo failures are ignored.
                let _ = echo.write_all(&buf[..n]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed to read test output: {e}");
                break;
            }
        }
    }
    let _ = echo.flush();
    captured
}
