/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template text parser.
//!
//! Turns Mustache source into a [`Template`] tree. The parser is a
//! single forward pass over the input bytes with a small amount of
//! bookkeeping for standalone-line trimming: a line that holds nothing
//! but whitespace and a block tag, close tag, comment, set-delimiter
//! tag, or partial disappears from the output, and a standalone partial
//! additionally records its line's leading whitespace as an indent
//! prefix.
//!
//! Delimiters default to `{{`/`}}` and can be changed mid-input with
//! `{{=<% %>=}}`; both delimiters are borrowed slices of the input.

use std::sync::Arc;

use crate::ast::{Block, BlockTag, Content, OverrideMap, Partial, Variable};
use crate::error::{ParseError, ParseResult};

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    contents: Vec<Content>,
}

impl Template {
    /// Parses template source.
    pub fn compile(source: &str) -> ParseResult<Template> {
        let mut parser = Parser {
            src: source,
            open: "{{",
            close: "}}",
            pure: true,
        };
        let mut contents = Vec::new();
        let mut i = 0;
        parser.parse_contents(0, &mut i, "", &mut contents)?;
        Ok(Template { contents })
    }

    /// The top-level content nodes.
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }
}

impl std::str::FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Template> {
        Template::compile(s)
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

/// Outcome of one tag, steering the standalone-line bookkeeping in
/// [`Parser::parse_content`].
#[derive(Default)]
struct TagResult {
    is_end_section: bool,
    check_standalone: bool,
    is_standalone: bool,
}

struct Parser<'t> {
    src: &'t str,
    open: &'t str,
    close: &'t str,
    /// True while the current line has seen only whitespace so far.
    pure: bool,
}

impl<'t> Parser<'t> {
    fn slice(&self, from: usize, to: usize) -> &'t str {
        &self.src[from..to]
    }

    /// Advances past whitespace; true if the end of input was reached.
    fn skip(&self, i: &mut usize) -> bool {
        let b = self.src.as_bytes();
        while *i < b.len() {
            if !is_space(b[*i]) {
                return false;
            }
            *i += 1;
        }
        true
    }

    fn parse_sentinel(&self, i: &mut usize, c: u8) -> bool {
        if *i < self.src.len() && self.src.as_bytes()[*i] == c {
            *i += 1;
            self.skip(i);
            return true;
        }
        false
    }

    fn parse_lit(&self, i: &mut usize, lit: &str) -> bool {
        if self.src.len() - *i < lit.len() {
            return false;
        }
        if self.src.as_bytes()[*i..*i + lit.len()] == *lit.as_bytes() {
            *i += lit.len();
            return true;
        }
        false
    }

    /// Consumes a leading `*` (dynamic-name sigil) into `key`.
    fn parse_dyn_sigil(&self, i: &mut usize, key: &mut String) {
        self.skip(i);
        if *i < self.src.len() && self.src.as_bytes()[*i] == b'*' {
            key.push('*');
            *i += 1;
        }
    }

    /// Scans a tag key up to the close delimiter, appending it to `key`
    /// with surrounding whitespace trimmed. Returns the byte offset of
    /// the first `:` within the key, or 0 when there is none.
    ///
    /// `sentinel` is the extra close byte of triple-mustache tags
    /// (`}` before `}}`), or 0.
    fn expect_key(&self, i: &mut usize, key: &mut String, sentinel: u8) -> ParseResult<usize> {
        let b = self.src.as_bytes();
        let len = b.len();
        let mut split = 0;
        self.skip(i);
        let i0 = *i;
        while *i < len {
            let i1 = *i;
            if is_space(b[*i]) {
                *i += 1;
                self.skip(i);
            }
            if sentinel == 0 || self.parse_sentinel(i, sentinel) {
                if self.parse_lit(i, self.close) {
                    // An empty key or an empty format spec is invalid.
                    let empty = if split != 0 {
                        split + 1 == i1 - i0
                    } else {
                        i0 == i1
                    };
                    if empty {
                        break;
                    }
                    key.push_str(self.slice(i0, i1));
                    return Ok(split);
                }
            }
            if *i >= len {
                break;
            }
            if split == 0 && b[*i] == b':' {
                split = *i - i0;
                if split == 0 {
                    break;
                }
            }
            *i += 1;
        }
        Err(ParseError::InvalidKey(*i))
    }

    /// After a tag on a whitespace-only line, consumes up to the end of
    /// that line. Returns the position content resumes at and whether
    /// the tag sat alone on its line so far.
    fn process_pure(&self, i: &mut usize) -> (usize, bool) {
        let b = self.src.as_bytes();
        let mut start = *i;
        let mut standalone = self.pure;
        if self.pure {
            while *i < b.len() {
                if b[*i] == b'\n' {
                    *i += 1;
                    start = *i;
                    break;
                } else if is_space(b[*i]) {
                    *i += 1;
                } else {
                    standalone = false;
                    break;
                }
            }
        }
        (start, standalone)
    }

    fn expect_block(&mut self, i: &mut usize, tag: BlockTag) -> ParseResult<(Block, bool)> {
        let mut raw = String::new();
        let split = self.expect_key(i, &mut raw, 0)?;
        let (i0, standalone) = self.process_pure(i);
        // A key of the shape `alias:real-key` closes with the alias.
        let (key, section) = if split != 0 {
            (raw[split + 1..].to_string(), raw[..split].to_string())
        } else {
            (raw.clone(), raw)
        };
        let mut contents = Vec::new();
        self.parse_contents(i0, i, &section, &mut contents)?;
        Ok((Block { tag, key, contents }, standalone))
    }

    /// Parses the body of `{{<name}}…{{/name}}`, keeping only the
    /// inheritance blocks inside as overrides.
    fn expect_inheritance(&mut self, i: &mut usize, partial: &mut Partial) -> ParseResult<bool> {
        self.expect_key(i, &mut partial.key, 0)?;
        let (mut i0, standalone) = self.process_pure(i);
        let section = partial.key.clone();
        let mut overrides = OverrideMap::new();
        loop {
            let mut text = "";
            let mut attr = None;
            let end = self.parse_content(&mut i0, i, &section, &mut text, &mut attr)?;
            if let Some(Content::Block(block)) = attr {
                if block.tag == BlockTag::Inheritance {
                    overrides.entry(block.key).or_insert(block.contents);
                }
            }
            if end {
                break;
            }
        }
        partial.overrides = Arc::new(overrides);
        Ok(standalone)
    }

    fn expect_comment(&mut self, i: &mut usize) -> ParseResult<()> {
        let len = self.src.len();
        while *i < len {
            if self.parse_lit(i, self.close) {
                return Ok(());
            }
            if self.parse_lit(i, self.open) {
                // Nested delimiter pairs inside a comment are skipped.
                while !self.parse_lit(i, self.close) {
                    if *i >= len {
                        return Err(ParseError::UnclosedTag(*i));
                    }
                    *i += 1;
                }
            } else {
                *i += 1;
            }
        }
        Err(ParseError::UnclosedTag(*i))
    }

    fn expect_set_delim(&mut self, i: &mut usize) -> ParseResult<()> {
        let b = self.src.as_bytes();
        let len = b.len();
        self.skip(i);
        let mut i0 = *i;
        loop {
            if *i >= len {
                return Err(ParseError::InvalidDelimiter(*i));
            }
            if is_space(b[*i]) {
                break;
            }
            *i += 1;
        }
        self.open = self.slice(i0, *i);
        self.skip(i);
        i0 = *i;
        let i1;
        loop {
            if *i >= len {
                return Err(ParseError::MismatchedSetDelim(*i));
            }
            if b[*i] == b'=' {
                i1 = *i;
                break;
            }
            if is_space(b[*i]) {
                i1 = *i;
                *i += 1;
                if self.skip(i) || b[*i] != b'=' {
                    return Err(ParseError::MismatchedSetDelim(*i));
                }
                break;
            }
            *i += 1;
        }
        if i0 == i1 {
            return Err(ParseError::InvalidDelimiter(*i));
        }
        *i += 1;
        self.skip(i);
        // The tag still closes with the previous close delimiter.
        if !self.parse_lit(i, self.close) {
            return Err(ParseError::UnclosedTag(*i));
        }
        self.close = self.slice(i0, i1);
        Ok(())
    }

    fn expect_tag(
        &mut self,
        i: &mut usize,
        section: &str,
        attr: &mut Option<Content>,
    ) -> ParseResult<TagResult> {
        if self.skip(i) {
            return Err(ParseError::InvalidKey(*i));
        }
        let b = self.src.as_bytes();
        let mut ret = TagResult::default();
        match b[*i] {
            sigil @ (b'#' | b'^' | b'?' | b'*' | b'$') => {
                let tag = match sigil {
                    b'#' => BlockTag::Section,
                    b'^' => BlockTag::Inversion,
                    b'?' => BlockTag::Filter,
                    b'*' => BlockTag::Loop,
                    _ => BlockTag::Inheritance,
                };
                *i += 1;
                let (block, standalone) = self.expect_block(i, tag)?;
                ret.is_standalone = standalone;
                *attr = Some(Content::Block(block));
            }
            b'/' => {
                *i += 1;
                self.skip(i);
                if !self.parse_lit(i, section) {
                    return Err(ParseError::MismatchedSection(*i));
                }
                self.skip(i);
                if !self.parse_lit(i, self.close) {
                    return Err(ParseError::UnclosedTag(*i));
                }
                ret.check_standalone = self.pure;
                ret.is_end_section = true;
            }
            b'!' => {
                *i += 1;
                self.expect_comment(i)?;
                ret.check_standalone = self.pure;
            }
            b'=' => {
                *i += 1;
                self.expect_set_delim(i)?;
                ret.check_standalone = self.pure;
            }
            b'>' => {
                *i += 1;
                let mut key = String::new();
                self.parse_dyn_sigil(i, &mut key);
                self.expect_key(i, &mut key, 0)?;
                *attr = Some(Content::Partial(Partial {
                    key,
                    indent: String::new(),
                    overrides: Arc::new(OverrideMap::new()),
                }));
                ret.check_standalone = self.pure;
            }
            sigil @ (b'&' | b'{') => {
                let sentinel = if sigil == b'{' { b'}' } else { 0 };
                *i += 1;
                let mut key = String::new();
                let split = self.expect_key(i, &mut key, sentinel)?;
                *attr = Some(Content::Variable(make_variable(key, split, false)));
                self.pure = false;
            }
            b'<' => {
                *i += 1;
                let mut partial = Partial {
                    key: String::new(),
                    indent: String::new(),
                    overrides: Arc::new(OverrideMap::new()),
                };
                self.parse_dyn_sigil(i, &mut partial.key);
                ret.is_standalone = self.expect_inheritance(i, &mut partial)?;
                *attr = Some(Content::Partial(partial));
            }
            _ => {
                let mut key = String::new();
                let split = self.expect_key(i, &mut key, 0)?;
                *attr = Some(Content::Variable(make_variable(key, split, true)));
                self.pure = false;
            }
        }
        Ok(ret)
    }

    /// Scans up to and through the next tag (or end of input). Literal
    /// text goes out through `text`, a parsed tag through `attr`.
    /// Returns true when the caller's content list is complete.
    fn parse_content(
        &mut self,
        i0: &mut usize,
        i: &mut usize,
        section: &str,
        text: &mut &'t str,
        attr: &mut Option<Content>,
    ) -> ParseResult<bool> {
        let b = self.src.as_bytes();
        let len = b.len();
        let mut i1 = *i;
        while *i < len {
            if b[*i] == b'\n' {
                self.pure = true;
                *i += 1;
                i1 = *i;
            } else if is_space(b[*i]) {
                *i += 1;
            } else {
                let i2 = *i;
                if self.parse_lit(i, self.open) {
                    let mut tag = self.expect_tag(i, section, attr)?;
                    *text = self.slice(*i0, i1);
                    if tag.check_standalone {
                        let i3 = *i;
                        let mut alone = true;
                        while *i < len {
                            if b[*i] == b'\n' {
                                *i += 1;
                                break;
                            } else if is_space(b[*i]) {
                                *i += 1;
                            } else {
                                self.pure = false;
                                *text = self.slice(*i0, i2);
                                // i0 is local to a section body, so an
                                // end-section rewinds i instead.
                                if tag.is_end_section {
                                    *i = i3;
                                } else {
                                    *i0 = i3;
                                }
                                alone = false;
                                break;
                            }
                        }
                        if !alone {
                            return Ok(tag.is_end_section);
                        }
                        tag.is_standalone = true;
                    }
                    if !tag.is_standalone {
                        *text = self.slice(*i0, i2);
                    } else if let Some(Content::Partial(partial)) = attr {
                        partial.indent = self.slice(i1, i2).to_string();
                    }
                    *i0 = *i;
                    return Ok(*i >= len || tag.is_end_section);
                } else {
                    self.pure = false;
                    *i += 1;
                }
            }
        }
        *text = self.slice(*i0, *i);
        Ok(true)
    }

    fn parse_contents(
        &mut self,
        mut i0: usize,
        i: &mut usize,
        section: &str,
        out: &mut Vec<Content>,
    ) -> ParseResult<()> {
        loop {
            let mut text = "";
            let mut attr = None;
            let end = self.parse_content(&mut i0, i, section, &mut text, &mut attr)?;
            if !text.is_empty() {
                out.push(Content::Text(text.to_string()));
            }
            if let Some(content) = attr {
                out.push(content);
            }
            if end {
                return Ok(());
            }
        }
    }
}

/// Splits a variable key at its stored `:` offset into key and format
/// spec.
fn make_variable(key: String, split: usize, escaped: bool) -> Variable {
    if split != 0 {
        Variable {
            spec: Some(key[split + 1..].to_string()),
            key: key[..split].to_string(),
            escaped,
        }
    } else {
        Variable {
            key,
            spec: None,
            escaped,
        }
    }
}
