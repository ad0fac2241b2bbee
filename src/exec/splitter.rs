// src/exec/splitter.rs

//! Route a line stream to one of two sinks around a marker line.
//!
//! Lines go to the default sink until a line matching the marker shows up.
//! The marker line itself is dropped and every later line goes to the
//! redirect sink. The switch happens at most once per stream.
//!
//! `helm upgrade --debug` prints its debug chatter first and then echoes the
//! user-supplied values after a `USER-SUPPLIED VALUES:` header; splitting on
//! that header lets the values be persisted on their own.

use std::io;

use regex::bytes::Regex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Clone)]
enum Marker {
    Literal(Vec<u8>),
    Pattern(Regex),
}

impl Marker {
    fn matches(&self, line: &[u8]) -> bool {
        match self {
            Marker::Literal(needle) if needle.is_empty() => true,
            Marker::Literal(needle) => line.windows(needle.len()).any(|w| w == needle.as_slice()),
            Marker::Pattern(re) => re.is_match(line),
        }
    }
}

/// Where the lines of one stream ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub default_lines: usize,
    pub redirected_lines: usize,
    pub marker_seen: bool,
}

#[derive(Debug, Clone)]
pub struct OutputSplitter {
    marker: Marker,
}

impl OutputSplitter {
    /// Split on the first line containing `marker` as a literal substring.
    pub fn new(marker: impl AsRef<[u8]>) -> Self {
        Self {
            marker: Marker::Literal(marker.as_ref().to_vec()),
        }
    }

    /// Split on the first line matching `pattern`.
    pub fn with_pattern(pattern: Regex) -> Self {
        Self {
            marker: Marker::Pattern(pattern),
        }
    }

    /// Scan `reader` to EOF, writing each line verbatim (newline included) to
    /// the sink selected by the marker state.
    ///
    /// Write failures are logged and scanning continues. A read failure stops
    /// the scan; it is returned after both sinks have been flushed. Lines
    /// already routed stay where they are.
    pub async fn split<R, D, X>(
        &self,
        mut reader: R,
        default: &mut D,
        redirect: &mut X,
    ) -> io::Result<SplitSummary>
    where
        R: AsyncBufRead + Unpin,
        D: AsyncWrite + Unpin + ?Sized,
        X: AsyncWrite + Unpin + ?Sized,
    {
        let mut summary = SplitSummary::default();
        let mut line = Vec::new();
        let mut read_err = None;

        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    read_err = Some(e);
                    break;
                }
            }

            if summary.marker_seen {
                if let Err(e) = redirect.write_all(&line).await {
                    error!(error = %e, "writing redirected line failed");
                }
                summary.redirected_lines += 1;
                continue;
            }

            if self.marker.matches(&line) {
                debug!("marker line found; redirecting remaining output");
                summary.marker_seen = true;
                continue;
            }

            if let Err(e) = default.write_all(&line).await {
                error!(error = %e, "writing default line failed");
            }
            summary.default_lines += 1;
        }

        if let Err(e) = default.flush().await {
            error!(error = %e, "flushing default sink failed");
        }
        if let Err(e) = redirect.flush().await {
            error!(error = %e, "flushing redirect sink failed");
        }

        match read_err {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Run [`OutputSplitter::split`] as a background task.
    ///
    /// The caller owns the handle and must await it before relying on the
    /// sinks' contents.
    pub fn spawn<R, D, X>(
        self,
        reader: R,
        mut default: D,
        mut redirect: X,
    ) -> JoinHandle<io::Result<SplitSummary>>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        D: AsyncWrite + Unpin + Send + 'static,
        X: AsyncWrite + Unpin + Send + 'static,
    {
        tokio::spawn(async move { self.split(reader, &mut default, &mut redirect).await })
    }
}
