//! Raw response mirroring for troubleshooting
//!
//! A [`DiagnosticSink`] receives the request URL and the pretty-printed
//! response body of every successful fetch. Sinks are observers only: write
//! failures are swallowed and never reach the caller.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io::Write;
use std::sync::Mutex;

/// Receives raw request/response pairs
pub trait DiagnosticSink: Send + Sync {
    /// Record one fetched URL with its (pretty-printed when possible) body
    fn record(&self, url: &str, body: &str);
}

/// Sink that writes `GET <url>\n<body>\n` records to any [`Write`]
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn record(&self, url: &str, body: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "GET {url}\n{body}");
        }
    }
}

/// Re-indent a JSON body with tabs, or return it verbatim if it is not JSON
pub fn pretty_body(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return String::from_utf8_lossy(body).into_owned();
    };
    let mut out = Vec::with_capacity(body.len());
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
    if value.serialize(&mut serializer).is_err() {
        return String::from_utf8_lossy(body).into_owned();
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
