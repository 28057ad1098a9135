use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use colored::Colorize;
use serde_json::json;
use stash_store::{BlobStore, StoreConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    let session = Session::new(config.build()?, cli.format);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Shell => {
            session.run(io::stdin().lock(), &mut out)?;
            Ok(())
        }
        Command::Exec(args) => {
            let file = File::open(&args.script)
                .with_context(|| format!("cannot open script {}", args.script.display()))?;
            let failed = session.run(BufReader::new(file), &mut out)?;
            if failed > 0 {
                bail!("{failed} command(s) failed");
            }
            Ok(())
        }
    }
}

/// One parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum Op {
    Put { path: PathBuf, id: Option<String> },
    PutText { text: String },
    Get { id: String, path: PathBuf },
    Cat { id: String },
    Rm { id: String },
    Has { id: String },
    Ls,
    Stat,
}

fn parse_line(line: &str) -> anyhow::Result<Option<Op>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let cmd = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let op = match (cmd, args.as_slice()) {
        ("put", [path]) => Op::Put { path: path.into(), id: None },
        ("put", [path, id]) => Op::Put { path: path.into(), id: Some(id.to_string()) },
        ("put-text", words) if !words.is_empty() => Op::PutText { text: words.join(" ") },
        ("get", [id, path]) => Op::Get { id: id.to_string(), path: path.into() },
        ("cat", [id]) => Op::Cat { id: id.to_string() },
        ("rm", [id]) => Op::Rm { id: id.to_string() },
        ("has", [id]) => Op::Has { id: id.to_string() },
        ("ls", []) => Op::Ls,
        ("stat", []) => Op::Stat,
        ("put" | "put-text" | "get" | "cat" | "rm" | "has" | "ls" | "stat", _) => {
            return Err(anyhow!("wrong arguments for `{cmd}`"));
        }
        _ => return Err(anyhow!("unknown command `{cmd}`")),
    };
    Ok(Some(op))
}

/// Executes shell lines against one store.
pub struct Session {
    store: Arc<dyn BlobStore>,
    format: OutputFormat,
}

impl Session {
    pub fn new(store: Arc<dyn BlobStore>, format: OutputFormat) -> Self {
        Self { store, format }
    }

    /// Run every line of `input`. Failing lines, including lines that are
    /// not valid UTF-8, are reported on stderr and counted; the session keeps
    /// going.
    pub fn run(&self, mut input: impl BufRead, out: &mut dyn Write) -> anyhow::Result<usize> {
        let mut failed = 0;
        let mut raw = Vec::new();
        let mut n = 0;
        loop {
            raw.clear();
            if input
                .read_until(b'\n', &mut raw)
                .context("cannot read command input")?
                == 0
            {
                break;
            }
            n += 1;
            let result = std::str::from_utf8(&raw)
                .map_err(|e| anyhow!("command is not valid UTF-8: {e}"))
                .and_then(parse_line)
                .and_then(|op| match op {
                    Some(op) => self.execute(op, out),
                    None => Ok(()),
                });
            if let Err(e) = result {
                failed += 1;
                tracing::debug!(line = n, error = %e, "command failed");
                eprintln!("{} line {}: {:#}", "error:".red().bold(), n, e);
            }
        }
        Ok(failed)
    }

    fn execute(&self, op: Op, out: &mut dyn Write) -> anyhow::Result<()> {
        match op {
            Op::Put { path, id } => {
                let mut file = File::open(&path)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                let id = match id {
                    Some(id) => {
                        self.store.create_with_id(&mut file, &id)?;
                        id
                    }
                    None => self.store.create(&mut file)?,
                };
                self.emit(out, &id, json!({ "id": id }))
            }
            Op::PutText { text } => {
                let id = self.store.create_bytes(Bytes::from(text))?;
                self.emit(out, &id, json!({ "id": id }))
            }
            Op::Get { id, path } => {
                let data = self.store.view(&id)?;
                std::fs::write(&path, &data)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                let text = format!("{} {} -> {} ({} bytes)", "✓".green(), id, path.display(), data.len());
                self.emit(
                    out,
                    &text,
                    json!({ "id": id, "path": path, "bytes": data.len() }),
                )
            }
            Op::Cat { id } => match self.format {
                // Text mode writes the payload verbatim.
                OutputFormat::Text => {
                    let mut reader = self.store.read(&id)?;
                    io::copy(&mut reader, out)?;
                    Ok(())
                }
                OutputFormat::Json => {
                    let data = self.store.view(&id)?;
                    let text = std::str::from_utf8(&data).ok();
                    writeln!(out, "{}", json!({ "id": id, "bytes": data.len(), "text": text }))?;
                    Ok(())
                }
            },
            Op::Rm { id } => {
                self.store.delete(&id)?;
                let text = format!("{} removed {}", "✓".green(), id);
                self.emit(out, &text, json!({ "deleted": id }))
            }
            Op::Has { id } => {
                let exists = self.store.exists(&id)?;
                let text = if exists { "yes".green() } else { "no".red() }.to_string();
                self.emit(out, &text, json!({ "id": id, "exists": exists }))
            }
            Op::Ls => {
                let ids = self.store.list()?;
                match self.format {
                    OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&ids)?)?,
                    OutputFormat::Text => {
                        for id in &ids {
                            writeln!(out, "{id}")?;
                        }
                    }
                }
                Ok(())
            }
            Op::Stat => {
                // Blobs deleted between list and view are skipped.
                let ids = self.store.list()?;
                let mut blobs = 0usize;
                let mut bytes = 0u64;
                for id in &ids {
                    match self.store.view(id) {
                        Ok(data) => {
                            blobs += 1;
                            bytes += data.len() as u64;
                        }
                        Err(e) if e.is_not_found() => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                let text = format!("{} blobs, {} bytes", blobs.to_string().bold(), bytes);
                self.emit(out, &text, json!({ "blobs": blobs, "bytes": bytes }))
            }
        }
    }

    fn emit(&self, out: &mut dyn Write, text: &str, value: serde_json::Value) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(out, "{text}")?,
            OutputFormat::Json => writeln!(out, "{value}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_store::{GeneratorConfig, Keying};

    fn session(format: OutputFormat) -> Session {
        colored::control::set_override(false);
        let config = StoreConfig {
            keying: Keying::Text,
            generator: GeneratorConfig::Sequential { prefix: "b".into() },
        };
        Session::new(config.build().unwrap(), format)
    }

    fn run(session: &Session, script: &str) -> (usize, String) {
        let mut out = Vec::new();
        let failed = session.run(script.as_bytes(), &mut out).unwrap();
        (failed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parse_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# note").unwrap(), None);
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            parse_line("put a.bin key").unwrap(),
            Some(Op::Put { path: "a.bin".into(), id: Some("key".into()) })
        );
        assert_eq!(
            parse_line("put-text hello   world").unwrap(),
            Some(Op::PutText { text: "hello world".into() })
        );
        assert_eq!(parse_line("ls").unwrap(), Some(Op::Ls));
        assert!(parse_line("rm").is_err());
        assert!(parse_line("frobnicate x").is_err());
    }

    #[test]
    fn text_session_lifecycle() {
        let s = session(OutputFormat::Text);
        let (failed, out) = run(
            &s,
            "put-text hello\ncat b1\nhas b1\nrm b1\nhas b1\nls\n",
        );
        assert_eq!(failed, 0);
        // `cat` writes the payload verbatim, without a trailing newline.
        assert_eq!(out, "b1\nhelloyes\n✓ removed b1\nno\n");
    }

    #[test]
    fn failures_are_counted_and_session_continues() {
        let s = session(OutputFormat::Text);
        let (failed, out) = run(&s, "cat missing\nrm missing\nbogus\nput-text ok\n");
        assert_eq!(failed, 3);
        assert_eq!(out, "b1\n");
    }

    #[test]
    fn json_output() {
        let s = session(OutputFormat::Json);
        let (failed, out) = run(&s, "put-text abc\nput-text de\nls\nstat\n");
        assert_eq!(failed, 0);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0], json!({ "id": "b1" }));
        assert_eq!(lines[1], json!({ "id": "b2" }));
        assert_eq!(lines[2], json!(["b1", "b2"]));
        assert_eq!(lines[3], json!({ "blobs": 2, "bytes": 5 }));
    }

    #[test]
    fn put_and_get_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.bin");
        let dst = dir.path().join("out.bin");
        std::fs::write(&src, [0u8, 1, 2, 255]).unwrap();

        let s = session(OutputFormat::Text);
        let script = format!(
            "put {} mine\nput {} mine\nget mine {}\n",
            src.display(),
            src.display(),
            dst.display()
        );
        let (failed, _) = run(&s, &script);
        assert_eq!(failed, 1);
        assert_eq!(std::fs::read(&dst).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn invalid_utf8_line_fails_and_session_continues() {
        let s = session(OutputFormat::Text);
        let mut input = b"put-text one\nput-text ".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\nput-text two\n");

        let mut out = Vec::new();
        let failed = s.run(input.as_slice(), &mut out).unwrap();
        assert_eq!(failed, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "b1\nb2\n");
        assert_eq!(s.store.view("b2").unwrap(), Bytes::from_static(b"two"));
    }

    #[test]
    fn last_line_without_newline_runs() {
        let s = session(OutputFormat::Text);
        let (failed, out) = run(&s, "put-text a\r\nput-text b");
        assert_eq!(failed, 0);
        assert_eq!(out, "b1\nb2\n");
    }

    #[test]
    fn json_cat_stays_one_value_per_line() {
        let s = session(OutputFormat::Json);
        let mut input = b"put-text hi\n".to_vec();
        s.store
            .create_bytes_with_id(Bytes::from_static(&[0xff, 0x00]), "raw")
            .unwrap();
        input.extend_from_slice(b"cat b1\ncat raw\n");

        let mut out = Vec::new();
        assert_eq!(s.run(input.as_slice(), &mut out).unwrap(), 0);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[1], json!({ "id": "b1", "bytes": 2, "text": "hi" }));
        assert_eq!(lines[2], json!({ "id": "raw", "bytes": 2, "text": null }));
    }
}
