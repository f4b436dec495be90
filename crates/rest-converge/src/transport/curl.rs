//! `curl` subprocess transport.
//!
//! The child's pipes are handled in a fixed order: write the body and close
//! stdin, drain stdout, drain stderr, and only then wait for the exit
//! status. A child blocked on a full stdout pipe never exits, so waiting
//! first would deadlock. stderr is read after stdout and is assumed to stay
//! below the pipe buffer size (curl's diagnostics are a few lines).
//!
//! The head ends at the first empty line. When curl sends
//! `Expect: 100-continue` (large request documents), the interim
//! `HTTP/1.1 100 Continue` block is taken as the head and the final
//! response lands in the body.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{RawResponse, Transport};
use crate::error::{RestError, Result};
use crate::request::RequestSpec;

/// Runs requests through an external `curl` process.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: String,
    leading_args: Vec<String>,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CurlTransport {
    /// Use `curl` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: "curl".to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Use another program. `leading_args` go before the generated curl
    /// arguments, e.g. `("sh", ["-c", script, "curl"])`.
    pub fn with_command<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Transport for CurlTransport {
    fn execute(&self, request: &RequestSpec) -> Result<RawResponse> {
        let failure = |status: Option<i32>, stderr: String| RestError::TransportFailure {
            method: request.method,
            url: request.url.clone(),
            status,
            stderr,
        };

        debug!(
            program = %self.program,
            method = %request.method,
            url = %request.url,
            "Spawning HTTP client"
        );

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(request.curl_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failure(None, format!("failed to start {}: {e}", self.program)))?;

        // Dropping stdin at the end of this block closes it, which ends the
        // request document.
        let mut write_error = None;
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(body) = &request.body {
                if let Err(e) = stdin.write_all(body) {
                    warn!(url = %request.url, error = %e, "Failed to send request document");
                    write_error = Some(e);
                }
            }
        }

        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(failure(None, "child process pipes unavailable".to_string()));
        };

        let mut stdout = BufReader::new(stdout);
        let head = read_head(&mut stdout);
        let mut body = Vec::new();
        let body_read = stdout.read_to_end(&mut body);

        let mut errors = Vec::new();
        let errors_read = stderr.read_to_end(&mut errors);
        let errors = String::from_utf8_lossy(&errors).trim_end().to_string();

        let status = child
            .wait()
            .map_err(|e| failure(None, format!("failed to wait for {}: {e}", self.program)))?;

        debug!(
            url = %request.url,
            status = ?status.code(),
            body_len = body.len(),
            "HTTP client finished"
        );

        if !status.success() {
            return Err(failure(status.code(), errors));
        }

        let lines = head
            .and_then(|lines| body_read.map(|_| lines))
            .map_err(|e| failure(status.code(), format!("reading response: {e}")))?;
        errors_read.map_err(|e| failure(status.code(), format!("reading diagnostics: {e}")))?;
        if let Some(e) = write_error {
            return Err(failure(status.code(), format!("sending document: {e}")));
        }

        Ok(RawResponse::from_head(lines, body))
    }
}

/// Read lines up to (and consuming) the first empty line, or end of stream.
fn read_head<R: BufRead>(reader: &mut R) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.is_empty() {
            break;
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(lines)
}
