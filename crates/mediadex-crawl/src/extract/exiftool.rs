use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use mediadex_core::traits::MetadataExtractor;
use mediadex_core::{Error, TrackMetadata};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const READY_MARKER: &str = "{ready}";

/// A long-lived `exiftool -stay_open True -@ -` child.
///
/// Requests are argument blocks written to stdin and terminated by
/// `-execute`; each response ends with a `{ready}` line on stdout.
pub struct ExifToolExtractor {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ExifToolExtractor {
    pub fn start(program: &str) -> mediadex_core::Result<Self> {
        let mut child = Command::new(program)
            .args(["-stay_open", "True", "-@", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::ExtractorUnavailable(format!("{}: {}", program, e)))?;

        let stdin = child.stdin.take();
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                return Err(Error::ExtractorUnavailable(format!("{}: stdout not captured", program)));
            }
        };
        debug!(program, pid = child.id(), "exiftool started");
        Ok(Self { child, stdin, stdout: BufReader::new(stdout) })
    }

    fn request(&mut self, path: &Path) -> io::Result<String> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "exiftool already closed"))?;
        stdin.write_all(&encode_request(path)?)?;
        stdin.flush()?;

        let mut response = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "exiftool exited mid-response"));
            }
            if line.trim_end() == READY_MARKER {
                return Ok(response);
            }
            response.push_str(&line);
        }
    }
}

/// One `-@` argument block for `path`, terminated by `-execute`.
///
/// Arguments are newline separated, so a path containing a newline cannot be
/// framed and is refused. The path goes out as its raw bytes and exiftool is
/// told to read file names as UTF-8.
fn encode_request(path: &Path) -> io::Result<Vec<u8>> {
    let name = path.as_os_str().as_encoded_bytes();
    if name.contains(&b'\n') {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "path contains a newline"));
    }
    let mut request = b"-charset\nfilename=utf8\n-json\n-Artist\n-Album\n-Duration\n".to_vec();
    request.extend_from_slice(name);
    request.extend_from_slice(b"\n-execute\n");
    Ok(request)
}

impl MetadataExtractor for ExifToolExtractor {
    fn extract(&mut self, path: &Path) -> Option<TrackMetadata> {
        match self.request(path) {
            Ok(raw) => parse_exiftool_json(&raw),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "exiftool request failed");
                None
            }
        }
    }

    fn close(&mut self) -> anyhow::Result<()> {
        let Some(mut stdin) = self.stdin.take() else { return Ok(()) };
        stdin.write_all(b"-stay_open\nFalse\n")?;
        stdin.flush()?;
        drop(stdin);
        let status = self.child.wait()?;
        debug!(%status, "exiftool stopped");
        Ok(())
    }
}

impl Drop for ExifToolExtractor {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, "exiftool did not shut down cleanly");
                let _ = self.child.kill();
            }
        }
    }
}

/// Parses the `-json` output for a single file.
///
/// `None` when exiftool printed nothing usable (unreadable file, not media).
pub fn parse_exiftool_json(raw: &str) -> Option<TrackMetadata> {
    let mut entries: Vec<Map<String, Value>> = serde_json::from_str(raw.trim()).ok()?;
    if entries.is_empty() {
        return None;
    }
    let entry = entries.swap_remove(0);
    if entry.contains_key("Error") {
        return None;
    }
    Some(TrackMetadata {
        artist: text_value(entry.get("Artist")),
        album: text_value(entry.get("Album")),
        duration: text_value(entry.get("Duration")).map(|d| nice_duration(&d)),
    })
}

fn text_value(v: Option<&Value>) -> Option<String> {
    let s = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Drops ExifTool's `(approx)` marker on estimated durations.
fn nice_duration(d: &str) -> String {
    d.replace("(approx)", "").trim().to_string()
}
