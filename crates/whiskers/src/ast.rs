/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed-template node types.
//!
//! A template is a list of [`Content`] nodes. The parser produces this
//! tree; the renderer only borrows it and never mutates it, so a single
//! parsed template can be shared between concurrent renders.

use std::collections::HashMap;
use std::sync::Arc;

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Literal text, emitted as-is (modulo partial re-indentation).
    Text(String),

    /// Variable interpolation: `{{key}}`, `{{&key}}` or `{{{key}}}`.
    Variable(Variable),

    /// A block tag: section, inversion, filter, loop or inheritance.
    Block(Block),

    /// Partial inclusion: `{{>name}}` or inheritance parent `{{<name}}`.
    Partial(Partial),
}

/// A variable interpolation tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Key path, e.g. `user.name` or `.` for the current cursor.
    pub key: String,
    /// Optional format spec taken from the text after the first `:`.
    pub spec: Option<String>,
    /// Whether output goes through the escaping sink.
    pub escaped: bool,
}

/// Semantic tag of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    /// `{{#key}}`: render the content iff the value is truthy, entering
    /// objects and iterating lists.
    Section,
    /// `{{^key}}`: render the content iff the value is falsy.
    Inversion,
    /// `{{?key}}`: like a section, but never enters or iterates.
    Filter,
    /// `{{*key}}`: force list semantics, iterating the value.
    Loop,
    /// `{{$key}}`: template-inheritance block with default content.
    Inheritance,
}

/// A block tag and its content list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub tag: BlockTag,
    pub key: String,
    pub contents: Vec<Content>,
}

/// Named content substitutions carried by an inheritance parent tag.
pub type OverrideMap = HashMap<String, Vec<Content>>;

/// A partial or inheritance-parent inclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// Partial name; a leading `*` marks a dynamic name resolved from
    /// data before lookup.
    pub key: String,
    /// Literal whitespace prefix of a standalone partial's line,
    /// re-emitted before every line the partial produces.
    pub indent: String,
    /// Override blocks from `{{<name}}…{{/name}}`; empty for `{{>name}}`.
    ///
    /// Shared so the renderer's override chain can hold onto an entry
    /// without borrowing the template it came from.
    pub overrides: Arc<OverrideMap>,
}

/// A read-only view of a pending (not yet expanded) section, handed to
/// lazy values and lazy formats so they may inspect the content they are
/// standing in for.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    contents: &'a [Content],
}

impl<'a> SectionView<'a> {
    pub(crate) fn new(contents: &'a [Content]) -> Self {
        Self { contents }
    }

    /// The section's unexpanded content nodes.
    pub fn contents(&self) -> &'a [Content] {
        self.contents
    }
}
