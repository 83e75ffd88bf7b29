use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};

use crate::logsink::LogSink;

/// What one engine run produced: the exit code plus every output line in
/// arrival order, stdout and stderr interleaved.
#[derive(Debug)]
pub struct EngineOutput {
    pub code: Option<i32>,
    pub lines: Vec<String>,
}

/// Run the engine to completion, pushing each output line into the sink as
/// it arrives. A non-zero exit becomes an error carrying the exit code.
pub fn run(program: &Path, args: &[String], sink: &mut LogSink) -> Result<EngineOutput> {
    let mut child = engine_command(program, args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(e, program))?;

    let (tx, rx) = mpsc::channel::<String>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, tx.clone()));
    }
    // The loop below ends once every sender is gone.
    drop(tx);

    let mut lines = Vec::new();
    for line in rx {
        sink.line(&line);
        lines.push(line);
    }
    for reader in readers {
        let _ = reader.join();
    }

    let status = child.wait().context("failed to wait for the engine")?;

    if !status.success() {
        bail!(
            "{} exited with code {}\n  hint: the export log above has the full engine output",
            program.display(),
            status
                .code()
                .map_or("signal".to_string(), |c| c.to_string())
        );
    }

    Ok(EngineOutput {
        code: status.code(),
        lines,
    })
}

/// Ask the engine for its version: first line of `--version` on success.
pub fn probe_version(program: &Path) -> Option<String> {
    let output = engine_command(program, &["--version".to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(|line| line.trim().to_string())
}

/// Bare engine names go through the Windows shell so launcher scripts like
/// `quarto.cmd` resolve via PATH; explicit paths, and everything on other
/// platforms, are invoked directly.
fn engine_command(program: &Path, args: &[String]) -> Command {
    let bare_name = program.components().count() == 1;
    if bare_name && cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(program).args(args);
        cmd
    } else {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

/// A failed launch nearly always means the engine is not installed or the
/// configured path is wrong; say that instead of surfacing a raw ENOENT.
fn launch_error(err: std::io::Error, program: &Path) -> anyhow::Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        anyhow::anyhow!(
            "could not run '{}'\n  hint: install Quarto (https://quarto.org) or point engine_path in the config at the executable",
            program.display()
        )
    } else {
        anyhow::Error::new(err).context(format!("failed to launch {}", program.display()))
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: R,
    tx: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}
