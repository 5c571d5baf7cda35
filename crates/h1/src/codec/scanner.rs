//! Line scanning over a partially received header block.
//!
//! The scanner walks a byte buffer line by line without copying. A line is
//! terminated by CRLF; a bare LF is tolerated for interoperability (with a
//! once-per-process diagnostic), but a CR that is not immediately followed
//! by LF is rejected outright. Folded continuation lines (obs-fold, a line
//! starting with SP or HT) are stitched onto the previous field's value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::protocol::error::ParseError;
use crate::utils::trim_ows;

/// Process-wide state for the bare-LF compatibility diagnostic.
///
/// Legacy peers terminate header lines with a bare `\n`. The first time a
/// scanner sees one, this object fires a single `tracing::warn!`; later
/// sightings stay silent for the rest of the process. The offending line is
/// included in the warning unless context inclusion is switched off (header
/// lines can carry credentials).
///
/// Scanners receive the instance at construction. Decoders default to the
/// shared process-wide instance from [`shared_newline_diagnostic`], but a
/// test or an isolated subsystem can carry its own.
#[derive(Debug)]
pub struct NewlineDiagnostic {
    warned: AtomicBool,
    include_context: AtomicBool,
}

impl Default for NewlineDiagnostic {
    fn default() -> Self {
        NewlineDiagnostic { warned: AtomicBool::new(false), include_context: AtomicBool::new(true) }
    }
}

impl NewlineDiagnostic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls whether the warning includes the offending line.
    pub fn set_include_context(&self, enabled: bool) {
        self.include_context.store(enabled, Ordering::Relaxed);
    }

    fn note(&self, line: &[u8]) {
        if self.warned.swap(true, Ordering::Relaxed) {
            return;
        }
        if self.include_context.load(Ordering::Relaxed) {
            warn!(
                line = %String::from_utf8_lossy(line),
                "header line terminated by bare LF instead of CRLF; only reported once"
            );
        } else {
            warn!("header line terminated by bare LF instead of CRLF; only reported once");
        }
    }
}

static SHARED_NEWLINE_DIAGNOSTIC: Lazy<Arc<NewlineDiagnostic>> =
    Lazy::new(|| Arc::new(NewlineDiagnostic::new()));

/// The process-wide diagnostic instance the decoders use by default.
pub fn shared_newline_diagnostic() -> Arc<NewlineDiagnostic> {
    Arc::clone(&SHARED_NEWLINE_DIAGNOSTIC)
}

/// One scan step.
pub(crate) enum Scan<'a> {
    /// A complete non-empty line, terminator stripped.
    Line(&'a [u8]),
    /// An empty line: the end of the header block.
    Blank,
    /// No full line in the buffer yet.
    Partial,
}

/// Cursor over an incoming header block.
pub(crate) struct LineScanner<'a> {
    buf: &'a [u8],
    pos: usize,
    newline: &'a NewlineDiagnostic,
}

impl<'a> LineScanner<'a> {
    pub fn new(buf: &'a [u8], newline: &'a NewlineDiagnostic) -> Self {
        LineScanner { buf, pos: 0, newline }
    }

    /// Bytes consumed so far, including line terminators.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Advances past the next line.
    pub fn next_line(&mut self) -> Result<Scan<'a>, ParseError> {
        let rest = &self.buf[self.pos..];
        let Some(lf) = rest.iter().position(|b| *b == b'\n') else {
            return Ok(Scan::Partial);
        };
        self.pos += lf + 1;

        let mut line = &rest[..lf];
        if let Some((b'\r', head)) = line.split_last() {
            line = head;
        } else {
            self.newline.note(line);
        }
        // Any CR left at this point is not part of a terminator.
        if line.contains(&b'\r') {
            return Err(ParseError::malformed_header_line("lone CR in header line"));
        }

        if line.is_empty() { Ok(Scan::Blank) } else { Ok(Scan::Line(line)) }
    }

    /// Skips empty lines, as permitted between pipelined messages.
    pub fn skip_blank_lines(&mut self) {
        loop {
            let mark = self.pos;
            match self.next_line() {
                Ok(Scan::Blank) => {}
                _ => {
                    self.pos = mark;
                    return;
                }
            }
        }
    }
}

/// Scans `name: value` lines up to the blank terminator, assembling folded
/// continuations, and hands each completed field to `each`.
///
/// Returns `Ok(false)` when the buffer ends before the terminator (nothing
/// should be consumed yet) and `Ok(true)` once the block is complete.
pub(crate) fn scan_fields<F>(scanner: &mut LineScanner<'_>, mut each: F) -> Result<bool, ParseError>
where
    F: FnMut(&[u8], &[u8]) -> Result<(), ParseError>,
{
    let mut pending_name: &[u8] = &[];
    let mut pending_value: &[u8] = &[];
    let mut has_pending = false;
    let mut scratch: Vec<u8> = Vec::new();
    let mut folded = false;

    loop {
        match scanner.next_line()? {
            Scan::Partial => return Ok(false),
            Scan::Blank => {
                if has_pending {
                    each(pending_name, if folded { &scratch } else { pending_value })?;
                }
                return Ok(true);
            }
            Scan::Line(line) => {
                if line[0] == b' ' || line[0] == b'\t' {
                    // obs-fold: continuation of the previous field's value.
                    if !has_pending {
                        return Err(ParseError::malformed_header_line(
                            "continuation line without a preceding field",
                        ));
                    }
                    if !folded {
                        scratch.clear();
                        scratch.extend_from_slice(pending_value);
                        folded = true;
                    }
                    scratch.push(b' ');
                    scratch.extend_from_slice(trim_ows(line));
                } else {
                    if has_pending {
                        each(pending_name, if folded { &scratch } else { pending_value })?;
                    }
                    let colon = line.iter().position(|b| *b == b':').ok_or_else(|| {
                        ParseError::malformed_header_line("header line without a colon")
                    })?;
                    let name = trim_ows(&line[..colon]);
                    if name.is_empty() {
                        return Err(ParseError::malformed_header_line("empty header name"));
                    }
                    pending_name = name;
                    pending_value = trim_ows(&line[colon + 1..]);
                    has_pending = true;
                    folded = false;
                }
            }
        }
    }
}
