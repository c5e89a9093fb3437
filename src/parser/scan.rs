use std::io::BufRead;

use tracing::{error, warn};

use super::lines::{classify_line, Line};
use crate::index::{ProblemRecord, RecordIndex};

const MAX_CONSECUTIVE_READ_ERRORS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// `## ` section headers seen, repeats included.
    pub headers: usize,
    /// Header names missing from the catalog, in order of first appearance.
    pub unknown: Vec<String>,
    /// Link/terminator lines met before any header.
    pub orphan_markers: usize,
    pub read_errors: usize,
}

enum ReadLine {
    Line(String),
    Failed,
    End,
}

struct LineReader<R> {
    inner: R,
    consecutive_errors: usize,
    errors: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            consecutive_errors: 0,
            errors: 0,
        }
    }

    fn next_line(&mut self) -> ReadLine {
        let mut buf = String::new();
        match self.inner.read_line(&mut buf) {
            Ok(0) => ReadLine::End,
            Ok(_) => {
                self.consecutive_errors = 0;
                let line = buf.strip_suffix('\n').unwrap_or(&buf);
                let line = line.strip_suffix('\r').unwrap_or(line);
                ReadLine::Line(line.to_string())
            }
            Err(e) => {
                self.errors += 1;
                self.consecutive_errors += 1;
                if self.consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    error!("giving up after {} consecutive read errors: {}", self.consecutive_errors, e);
                    return ReadLine::End;
                }
                error!("read line error: {}", e);
                ReadLine::Failed
            }
        }
    }

    /// Markers are followed by one decorative line; read it and drop it.
    fn discard(&mut self) {
        let _ = self.next_line();
    }
}

struct Scanner<R> {
    lines: LineReader<R>,
    index: RecordIndex,
    current: Option<String>,
    pending: String,
    report: ScanReport,
}

impl<R: BufRead> Scanner<R> {
    fn run(mut self) -> (RecordIndex, ScanReport) {
        loop {
            let line = match self.lines.next_line() {
                ReadLine::Line(line) => line,
                ReadLine::Failed => continue,
                ReadLine::End => break,
            };
            match classify_line(&line) {
                Line::Header(name) => self.on_header(name),
                Line::Link(url) => self.on_link(url),
                Line::Solution => self.on_solution(),
                Line::Result => self.on_result(),
                Line::Body(text) => {
                    self.pending.push_str(text);
                    self.pending.push('\n');
                }
            }
        }
        // Whatever is still pending never reached a terminator.
        self.report.read_errors = self.lines.errors;
        (self.index, self.report)
    }

    fn on_header(&mut self, name: &str) {
        self.report.headers += 1;
        if !self.index.contains_key(name) {
            warn!(name = %name, "unknown problem");
            self.index.insert(name.to_string(), ProblemRecord::new(name, ""));
            self.report.unknown.push(name.to_string());
        }
        self.current = Some(name.to_string());
        self.lines.discard();
        self.pending.clear();
    }

    fn on_link(&mut self, url: &str) {
        if let Some(rec) = self.current_record("link") {
            rec.link = url.to_string();
        }
        self.lines.discard();
        self.pending.clear();
    }

    fn on_solution(&mut self) {
        let text = std::mem::take(&mut self.pending);
        if let Some(rec) = self.current_record("solution") {
            rec.content = text;
        }
        self.lines.discard();
    }

    fn on_result(&mut self) {
        let text = std::mem::take(&mut self.pending);
        if let Some(rec) = self.current_record("result") {
            rec.result = text;
        }
    }

    fn current_record(&mut self, marker: &str) -> Option<&mut ProblemRecord> {
        let Some(name) = self.current.as_deref() else {
            warn!(marker, "marker before any problem header, ignored");
            self.report.orphan_markers += 1;
            return None;
        };
        self.index.get_mut(name)
    }
}

/// Merge the markdown notebook into `index`, one line at a time.
pub fn scan<R: BufRead>(reader: R, index: RecordIndex) -> (RecordIndex, ScanReport) {
    Scanner {
        lines: LineReader::new(reader),
        index,
        current: None,
        pending: String::new(),
        report: ScanReport::default(),
    }
    .run()
}

// ── Tests ──
