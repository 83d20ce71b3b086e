/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output sinks and escaping.
//!
//! The renderer writes through a [`Sink`]; escaped variables go through
//! an [`EscapeFn`] first. The default is [`no_escape`]; [`escape_html`]
//! is the usual choice for HTML output.

use std::io;

use crate::error::RenderResult;

/// Destination for rendered output.
pub trait Sink {
    fn write_str(&mut self, s: &str) -> RenderResult<()>;
}

impl Sink for String {
    fn write_str(&mut self, s: &str) -> RenderResult<()> {
        self.push_str(s);
        Ok(())
    }
}

/// Adapts any [`io::Write`] into a [`Sink`].
pub struct IoSink<W: io::Write> {
    writer: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> Sink for IoSink<W> {
    fn write_str(&mut self, s: &str) -> RenderResult<()> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }
}

/// Escaping applied to `{{key}}` interpolations.
pub type EscapeFn = fn(&mut dyn Sink, &str) -> RenderResult<()>;

/// Passes text through unchanged.
pub fn no_escape(sink: &mut dyn Sink, s: &str) -> RenderResult<()> {
    sink.write_str(s)
}

/// Replaces the HTML-significant characters `&`, `<`, `>`, `\` and `"`
/// with entities.
pub fn escape_html(sink: &mut dyn Sink, s: &str) -> RenderResult<()> {
    let mut start = 0;
    for (i, byte) in s.bytes().enumerate() {
        let entity = match byte {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'\\' => "&#92;",
            b'"' => "&quot;",
            _ => continue,
        };
        if start < i {
            sink.write_str(&s[start..i])?;
        }
        sink.write_str(entity)?;
        start = i + 1;
    }
    sink.write_str(&s[start..])
}
