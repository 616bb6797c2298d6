use std::io::{self, Stderr, Write};

use scopelog_types::Severity;

use crate::buffer::RecordBuffer;
use crate::format::Decorated;

/// Console-like write target with one operation per severity
pub trait OutputSink {
    fn error(&mut self, line: Decorated);
    fn warn(&mut self, line: Decorated);
    fn info(&mut self, line: Decorated);
    fn debug(&mut self, line: Decorated);

    /// Dispatch to the operation matching `severity`
    fn write(&mut self, severity: Severity, line: Decorated) {
        match severity {
            Severity::Error => self.error(line),
            Severity::Warn => self.warn(line),
            Severity::Info => self.info(line),
            Severity::Debug => self.debug(line),
        }
    }
}

/// Writes rendered lines to a terminal stream
pub struct ConsoleSink<W: Write = Stderr> {
    writer: W,
}

impl ConsoleSink<Stderr> {
    pub fn stderr() -> Self {
        Self {
            writer: io::stderr(),
        }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, line: Decorated) {
        // a closed stream is not worth failing a log call over
        let _ = writeln!(self.writer, "{}", line.render_ansi());
    }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    fn error(&mut self, line: Decorated) {
        self.emit(line);
    }

    fn warn(&mut self, line: Decorated) {
        self.emit(line);
    }

    fn info(&mut self, line: Decorated) {
        self.emit(line);
    }

    fn debug(&mut self, line: Decorated) {
        self.emit(line);
    }
}

/// Collects lines into a shared [`RecordBuffer`]; clones write to the same buffer
#[derive(Clone)]
pub struct BufferSink {
    buffer: RecordBuffer,
}

impl BufferSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RecordBuffer::new(capacity),
        }
    }

    pub fn buffer(&self) -> &RecordBuffer {
        &self.buffer
    }
}

impl OutputSink for BufferSink {
    fn error(&mut self, line: Decorated) {
        self.buffer.push(Severity::Error, line);
    }

    fn warn(&mut self, line: Decorated) {
        self.buffer.push(Severity::Warn, line);
    }

    fn info(&mut self, line: Decorated) {
        self.buffer.push(Severity::Info, line);
    }

    fn debug(&mut self, line: Decorated) {
        self.buffer.push(Severity::Debug, line);
    }
}
