/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A Mustache template engine with a pluggable value model.
//!
//! Templates are compiled once and rendered any number of times, from
//! any number of threads, against a [`Value`] data tree:
//!
//! ```
//! use whiskers::{object, list, Template};
//!
//! let t = Template::compile("{{#items}}* {{name}}\n{{/items}}").unwrap();
//! let data = object([(
//!     "items",
//!     list([object([("name", "one")]), object([("name", "two")])]),
//! )]);
//! assert_eq!(t.render(&data).unwrap(), "* one\n* two\n");
//! ```
//!
//! Beyond core Mustache this engine supports filter (`{{?k}}`) and
//! loop (`{{*k}}`) blocks, template inheritance (`{{<parent}}` with
//! `{{$block}}` overrides), dynamic partial names (`{{>*name}}`),
//! format specs on variables (`{{n:05}}`), close-tag aliases
//! (`{{#a:long-key}}…{{/a}}`), and lazy values and lazy formats
//! computed at render time.

pub mod ast;
pub mod context;
pub mod error;
pub mod output;
pub mod parser;
pub mod render;
pub mod value;

mod json;

pub use ast::SectionView;
pub use context::{MemoryContext, NoContext, PartialContext};
pub use error::{ParseError, ParseResult, RenderError, RenderResult};
pub use output::{escape_html, no_escape, EscapeFn, IoSink, Sink};
pub use parser::Template;
pub use render::{render, UnresolvedHandler};
pub use value::{list, object, Kind, Value};
