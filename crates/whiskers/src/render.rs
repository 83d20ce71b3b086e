/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The render core: scope chain, name resolution, content dispatch and
//! section expansion.
//!
//! Two positions travel through a render side by side: the *scope*, a
//! parent-linked chain of objects searched by unqualified names, and
//! the *cursor*, the value `.` refers to. Sections entered on an object
//! push both; list iteration moves only the cursor.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use crate::ast::{Block, BlockTag, Content, OverrideMap, Partial, SectionView, Variable};
use crate::context::{NoContext, PartialContext};
use crate::error::RenderResult;
use crate::output::{escape_html, no_escape, EscapeFn, IoSink, Sink};
use crate::parser::Template;
use crate::value::{Kind, Value};

/// Handler consulted when a variable fails to resolve; receives the
/// failing name segment and supplies a replacement value, or an error
/// to abort the render.
pub type UnresolvedHandler<'a> = dyn Fn(&str) -> RenderResult<Value> + 'a;

/// One link in the scope chain.
struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    data: &'a Value,
}

/// Searches the scope chain for a field. Presence stops the search, so
/// a field that is present but null shadows an outer binding.
fn lookup<'a>(scope: &'a Scope<'a>, name: &str) -> Option<&'a Value> {
    let mut current = Some(scope);
    while let Some(scope) = current {
        if let Some(val) = scope.data.get_field(name) {
            return Some(val);
        }
        current = scope.parent;
    }
    None
}

enum Resolution<'a> {
    Found(&'a Value),
    /// Carries the name segment that failed to resolve.
    Missing(String),
}

/// Resolves a key against the scope chain and cursor. `.` is the
/// cursor itself, a leading `.` descends from the cursor, and anything
/// else looks up its head segment in the scope chain before descending
/// strictly.
fn resolve<'a>(scope: &'a Scope<'a>, cursor: &'a Value, key: &str) -> Resolution<'a> {
    if key.is_empty() {
        return Resolution::Missing(String::new());
    }
    if let Some(rest) = key.strip_prefix('.') {
        if rest.is_empty() {
            return Resolution::Found(cursor);
        }
        return descend(cursor, rest);
    }
    let (head, rest) = match key.find('.') {
        Some(pos) => (&key[..pos], &key[pos + 1..]),
        None => (key, ""),
    };
    match lookup(scope, head) {
        None => Resolution::Missing(head.to_string()),
        Some(val) if rest.is_empty() => Resolution::Found(val),
        Some(val) => {
            if matches!(val.kind(), Kind::LazyValue | Kind::LazyFormat) {
                Resolution::Missing(head.to_string())
            } else {
                descend(val, rest)
            }
        }
    }
}

/// Walks a dotted path without fallthrough. Intermediate segments must
/// resolve to objects.
fn descend<'a>(mut val: &'a Value, path: &str) -> Resolution<'a> {
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return match val.get_field(segment) {
                Some(found) => Resolution::Found(found),
                None => Resolution::Missing(segment.to_string()),
            };
        }
        match val.get_field(segment) {
            Some(next) if next.kind() == Kind::Object => val = next,
            _ => return Resolution::Missing(segment.to_string()),
        }
    }
    Resolution::Missing(String::new())
}

/// Prints a value to a plain string, forcing lazy values and ignoring
/// lazy formats. Used for dynamic-name dereferencing.
fn stringify(val: &Value) -> RenderResult<String> {
    match val {
        Value::LazyValue(f) => stringify(&f(None)?),
        _ => {
            let mut out = String::new();
            val.print(&mut out, None)?;
            Ok(out)
        }
    }
}

struct Renderer<'r> {
    sink: &'r mut dyn Sink,
    escape: EscapeFn,
    partials: &'r dyn PartialContext,
    unresolved: Option<&'r UnresolvedHandler<'r>>,
    /// Override maps from enclosing inheritance parents, oldest first.
    chain: Vec<Arc<OverrideMap>>,
    /// Accumulated partial indentation.
    indent: String,
    /// Whether the indent is still owed before the next output.
    needs_indent: bool,
}

impl<'r> Renderer<'r> {
    fn render_contents(
        &mut self,
        contents: &[Content],
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<()> {
        for content in contents {
            match content {
                Content::Text(text) => self.emit_text(text)?,
                Content::Variable(var) => self.render_variable(var, scope, cursor)?,
                Content::Block(block) => self.render_block(block, scope, cursor)?,
                Content::Partial(partial) => self.render_partial(partial, scope, cursor)?,
            }
        }
        Ok(())
    }

    /// Emits literal text, re-emitting the partial indent after every
    /// newline except a trailing one. A trailing newline instead owes
    /// the indent to whatever output comes next.
    fn emit_text(&mut self, text: &str) -> RenderResult<()> {
        if self.indent.is_empty() {
            return self.sink.write_str(text);
        }
        if self.needs_indent {
            self.sink.write_str(&self.indent)?;
        }
        let bytes = text.as_bytes();
        let (last, body) = match bytes.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };
        let mut start = 0;
        while let Some(pos) = memchr::memchr(b'\n', &body[start..]) {
            let line_end = start + pos + 1;
            self.sink.write_str(&text[start..line_end])?;
            self.sink.write_str(&self.indent)?;
            start = line_end;
        }
        self.needs_indent = *last == b'\n';
        self.sink.write_str(&text[start..])
    }

    fn render_variable(
        &mut self,
        var: &Variable,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<()> {
        let spec = var.spec.as_deref();
        match resolve(scope, cursor, &var.key) {
            Resolution::Found(val) => self.emit_variable(val, spec, var.escaped, scope, cursor),
            Resolution::Missing(name) => match self.unresolved {
                Some(handler) => {
                    let replacement = handler(&name)?;
                    self.emit_variable(&replacement, spec, var.escaped, scope, cursor)
                }
                None => Ok(()),
            },
        }
    }

    fn emit_variable(
        &mut self,
        val: &Value,
        spec: Option<&str>,
        escaped: bool,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<()> {
        if self.needs_indent {
            self.sink.write_str(&self.indent)?;
            self.needs_indent = false;
        }
        self.print_value(val, spec, escaped, scope, cursor)
    }

    /// Prints a value in interpolation position: lazy values recurse on
    /// their result, lazy formats splice their template under the
    /// current scope.
    fn print_value(
        &mut self,
        val: &Value,
        spec: Option<&str>,
        escaped: bool,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<()> {
        match val {
            Value::LazyValue(f) => {
                let computed = f(None)?;
                self.print_value(&computed, spec, escaped, scope, cursor)
            }
            Value::LazyFormat(f) => {
                let template = f(None)?;
                self.render_contents(template.contents(), scope, cursor)
            }
            _ => {
                let mut buf = String::new();
                val.print(&mut buf, spec)?;
                if escaped {
                    (self.escape)(&mut *self.sink, &buf)
                } else {
                    self.sink.write_str(&buf)
                }
            }
        }
    }

    fn render_block(&mut self, block: &Block, scope: &Scope<'_>, cursor: &Value) -> RenderResult<()> {
        if block.tag == BlockTag::Inheritance {
            // Oldest entry first, so the most-derived override wins.
            let found = self
                .chain
                .iter()
                .find(|map| map.contains_key(&block.key))
                .cloned();
            return match found {
                Some(map) => self.render_contents(&map[&block.key], scope, cursor),
                None => self.render_contents(&block.contents, scope, cursor),
            };
        }
        let key = self.deref_dyn_name(&block.key, scope, cursor)?;
        let fallthrough = match resolve(scope, cursor, &key) {
            Resolution::Found(val) => {
                self.expand_section(block.tag, &block.contents, val, scope, cursor)?
            }
            Resolution::Missing(_) => {
                self.expand_section(block.tag, &block.contents, &Value::Null, scope, cursor)?
            }
        };
        if fallthrough {
            self.render_contents(&block.contents, scope, cursor)?;
        }
        Ok(())
    }

    /// Decides what a section tag does with a value. Returns true when
    /// the caller should render the block contents in place (scope and
    /// cursor untouched); entering, iterating and splicing happen here.
    fn expand_section(
        &mut self,
        tag: BlockTag,
        contents: &[Content],
        val: &Value,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<bool> {
        match val {
            Value::LazyValue(f) => {
                if tag == BlockTag::Inversion {
                    return Ok(false);
                }
                let computed = f(Some(SectionView::new(contents)))?;
                return self.expand_section(tag, contents, &computed, scope, cursor);
            }
            Value::LazyFormat(f) => {
                if tag == BlockTag::Inversion {
                    return Ok(false);
                }
                if tag == BlockTag::Filter {
                    return Ok(true);
                }
                let template = f(Some(SectionView::new(contents)))?;
                self.render_contents(template.contents(), scope, cursor)?;
                return Ok(false);
            }
            _ => {}
        }
        let mut inverted = false;
        let kind = match tag {
            BlockTag::Inversion => {
                inverted = true;
                Kind::Atom
            }
            BlockTag::Filter => Kind::Atom,
            BlockTag::Loop => Kind::List,
            _ => val.kind(),
        };
        match kind {
            Kind::Null => Ok(inverted),
            Kind::Atom => Ok(val.is_truthy() != inverted),
            Kind::Object => {
                self.expand_on_object(contents, val, scope)?;
                Ok(false)
            }
            Kind::List => {
                match val {
                    Value::List(items) => {
                        for item in items {
                            self.expand_on_value(contents, item, scope)?;
                        }
                    }
                    // A loop over a non-list expands once with the
                    // value itself as cursor.
                    other => self.expand_on_value(contents, other, scope)?,
                }
                Ok(false)
            }
            Kind::LazyValue | Kind::LazyFormat => Ok(false),
        }
    }

    /// Expands content with the value pushed as both scope and cursor.
    fn expand_on_object(
        &mut self,
        contents: &[Content],
        val: &Value,
        scope: &Scope<'_>,
    ) -> RenderResult<()> {
        let inner = Scope {
            parent: Some(scope),
            data: val,
        };
        self.render_contents(contents, &inner, val)
    }

    /// Expands content once per value: objects enter the scope chain,
    /// everything else only moves the cursor.
    fn expand_on_value(
        &mut self,
        contents: &[Content],
        val: &Value,
        scope: &Scope<'_>,
    ) -> RenderResult<()> {
        if val.kind() == Kind::Object {
            self.expand_on_object(contents, val, scope)
        } else {
            self.render_contents(contents, scope, val)
        }
    }

    /// Resolves a `*name` dynamic name to the printed form of the named
    /// value; an unresolved dynamic name becomes the empty name.
    fn deref_dyn_name<'k>(
        &self,
        key: &'k str,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<Cow<'k, str>> {
        match key.strip_prefix('*') {
            None => Ok(Cow::Borrowed(key)),
            Some(inner) => match resolve(scope, cursor, inner) {
                Resolution::Found(val) => Ok(Cow::Owned(stringify(val)?)),
                Resolution::Missing(_) => Ok(Cow::Owned(String::new())),
            },
        }
    }

    fn render_partial(
        &mut self,
        partial: &Partial,
        scope: &Scope<'_>,
        cursor: &Value,
    ) -> RenderResult<()> {
        let name = self.deref_dyn_name(&partial.key, scope, cursor)?;
        let template = match self.partials.get(&name) {
            Some(template) => template,
            None => return Ok(()),
        };
        if template.contents().is_empty() {
            return Ok(());
        }
        let old_indent = self.indent.len();
        let old_chain = self.chain.len();
        self.indent.push_str(&partial.indent);
        self.needs_indent |= !partial.indent.is_empty();
        if !partial.overrides.is_empty() {
            self.chain.push(Arc::clone(&partial.overrides));
        }
        self.render_contents(template.contents(), scope, cursor)?;
        self.chain.truncate(old_chain);
        self.indent.truncate(old_indent);
        Ok(())
    }
}

/// Renders a template against `data`, writing through `sink`.
///
/// `escape` is applied to `{{key}}` interpolations only; raw tags and
/// literal text bypass it. `partials` answers `{{>name}}` lookups and
/// `unresolved`, when given, supplies replacement values for names that
/// fail to resolve. Output written before an error stays written.
pub fn render(
    sink: &mut dyn Sink,
    escape: EscapeFn,
    template: &Template,
    data: &Value,
    partials: &dyn PartialContext,
    unresolved: Option<&UnresolvedHandler<'_>>,
) -> RenderResult<()> {
    let mut renderer = Renderer {
        sink,
        escape,
        partials,
        unresolved,
        chain: Vec::new(),
        indent: String::new(),
        needs_indent: false,
    };
    let scope = Scope { parent: None, data };
    renderer.render_contents(template.contents(), &scope, data)
}

impl Template {
    /// Renders to a string without escaping or partials.
    pub fn render(&self, data: &Value) -> RenderResult<String> {
        self.render_with(data, &NoContext)
    }

    /// Renders to a string with partial lookup, without escaping.
    pub fn render_with(
        &self,
        data: &Value,
        partials: &dyn PartialContext,
    ) -> RenderResult<String> {
        let mut out = String::new();
        render(&mut out, no_escape, self, data, partials, None)?;
        Ok(out)
    }

    /// Renders to a string with HTML escaping on `{{key}}` tags.
    pub fn render_html(
        &self,
        data: &Value,
        partials: &dyn PartialContext,
    ) -> RenderResult<String> {
        let mut out = String::new();
        render(&mut out, escape_html, self, data, partials, None)?;
        Ok(out)
    }

    /// Renders into an [`io::Write`] without escaping or partials.
    pub fn render_to_writer<W: io::Write>(&self, data: &Value, writer: W) -> RenderResult<W> {
        let mut sink = IoSink::new(writer);
        render(&mut sink, no_escape, self, data, &NoContext, None)?;
        Ok(sink.into_inner())
    }
}
