/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The polymorphic data model rendered against templates.
//!
//! [`Value`] is an owned sum type over the shapes the renderer can
//! observe: the null value, scalar atoms, lists, objects, and two lazy
//! kinds that defer to user closures at render time. Each shape answers
//! the small capability surface the renderer needs: a [`Kind`] tag,
//! truthiness, field access, and scalar printing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::SectionView;
use crate::error::RenderResult;
use crate::parser::Template;

/// A lazy value: invoked at render time, optionally with a view of the
/// section it expands.
pub type LazyValueFn =
    dyn Fn(Option<SectionView<'_>>) -> RenderResult<Value> + Send + Sync;

/// A lazy format: produces a template that is spliced into the render
/// under the current scope.
pub type LazyFormatFn =
    dyn Fn(Option<SectionView<'_>>) -> RenderResult<Template> + Send + Sync;

/// A renderable value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Object(HashMap<String, Value>),
    LazyValue(Arc<LazyValueFn>),
    LazyFormat(Arc<LazyFormatFn>),
}

/// Shape tag of a [`Value`], ordered for the section expander's
/// tag-coercion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Null,
    Atom,
    Object,
    List,
    LazyValue,
    LazyFormat,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => Kind::Atom,
            Value::Object(_) => Kind::Object,
            Value::List(_) => Kind::List,
            Value::LazyValue(_) => Kind::LazyValue,
            Value::LazyFormat(_) => Kind::LazyFormat,
        }
    }

    /// Truthiness as observed by sections and inversions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(_) => true,
            Value::LazyValue(_) | Value::LazyFormat(_) => true,
        }
    }

    /// Field lookup on objects. Every other shape has no fields.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Constructs a lazy value from a closure.
    pub fn lazy_value<F>(f: F) -> Value
    where
        F: Fn(Option<SectionView<'_>>) -> RenderResult<Value> + Send + Sync + 'static,
    {
        Value::LazyValue(Arc::new(f))
    }

    /// Constructs a lazy format from a closure.
    pub fn lazy_format<F>(f: F) -> Value
    where
        F: Fn(Option<SectionView<'_>>) -> RenderResult<Template> + Send + Sync + 'static,
    {
        Value::LazyFormat(Arc::new(f))
    }

    /// Prints the scalar rendition of this value into `out`.
    ///
    /// Null, lists, and objects print nothing; the lazy kinds are the
    /// renderer's business and also print nothing here.
    pub(crate) fn print(&self, out: &mut String, spec: Option<&str>) -> RenderResult<()> {
        match self {
            Value::Null | Value::List(_) | Value::Object(_) => Ok(()),
            Value::Bool(b) => format_str(out, if *b { "true" } else { "false" }, spec),
            Value::Int(n) => format_number(out, &n.to_string(), spec, *n < 0),
            Value::Float(n) => {
                let prec = spec.and_then(FormatSpec::parse).and_then(|s| s.precision);
                let body = match prec {
                    Some(p) => format!("{:.*}", p, n),
                    None => n.to_string(),
                };
                format_number(out, &body, spec, *n < 0.0)
            }
            Value::String(s) => format_str(out, s, spec),
            Value::LazyValue(_) | Value::LazyFormat(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(fields) => f.debug_tuple("Object").field(fields).finish(),
            Value::LazyValue(_) => f.write_str("LazyValue(..)"),
            Value::LazyFormat(_) => f.write_str("LazyFormat(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Null
    }
}

/// A parsed formatting directive: `[[fill]align][0][width][.precision][type]`.
struct FormatSpec {
    fill: char,
    align: Option<char>,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

impl FormatSpec {
    fn parse(spec: &str) -> Option<FormatSpec> {
        let mut out = FormatSpec {
            fill: ' ',
            align: None,
            zero: false,
            width: 0,
            precision: None,
        };
        let mut chars: Vec<char> = spec.chars().collect();

        // Trailing type character; only a conversion hint, the value's
        // own shape decides how it prints.
        if matches!(chars.last(), Some(c) if c.is_ascii_alphabetic()) {
            chars.pop();
        }

        let mut i = 0;
        if chars.len() >= 2 && matches!(chars[1], '<' | '^' | '>') {
            out.fill = chars[0];
            out.align = Some(chars[1]);
            i = 2;
        } else if !chars.is_empty() && matches!(chars[0], '<' | '^' | '>') {
            out.align = Some(chars[0]);
            i = 1;
        }
        if i < chars.len() && chars[i] == '0' {
            out.zero = true;
            i += 1;
        }
        let mut width = 0usize;
        let mut saw_width = out.zero;
        while i < chars.len() && chars[i].is_ascii_digit() {
            width = width * 10 + (chars[i] as usize - '0' as usize);
            saw_width = true;
            i += 1;
        }
        out.width = width;
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            let mut prec = 0usize;
            let mut saw = false;
            while i < chars.len() && chars[i].is_ascii_digit() {
                prec = prec * 10 + (chars[i] as usize - '0' as usize);
                saw = true;
                i += 1;
            }
            if !saw {
                return None;
            }
            out.precision = Some(prec);
        }
        if i != chars.len() || (!saw_width && out.align.is_none() && out.precision.is_none()) {
            return None;
        }
        Some(out)
    }
}

fn pad(out: &mut String, body: &str, spec: &FormatSpec, default_align: char) {
    let len = body.chars().count();
    if len >= spec.width {
        out.push_str(body);
        return;
    }
    let total = spec.width - len;
    let align = spec.align.unwrap_or(default_align);
    let (left, right) = match align {
        '<' => (0, total),
        '>' => (total, 0),
        _ => (total / 2, total - total / 2),
    };
    for _ in 0..left {
        out.push(spec.fill);
    }
    out.push_str(body);
    for _ in 0..right {
        out.push(spec.fill);
    }
}

fn format_str(out: &mut String, body: &str, spec: Option<&str>) -> RenderResult<()> {
    match spec.and_then(FormatSpec::parse) {
        Some(spec) => pad(out, body, &spec, '<'),
        None => out.push_str(body),
    }
    Ok(())
}

fn format_number(out: &mut String, body: &str, spec: Option<&str>, negative: bool) -> RenderResult<()> {
    match spec.and_then(FormatSpec::parse) {
        Some(spec) if spec.zero && spec.align.is_none() => {
            // Zero padding goes between the sign and the digits.
            let digits = if negative { &body[1..] } else { body };
            let used = digits.chars().count() + usize::from(negative);
            if negative {
                out.push('-');
            }
            for _ in used..spec.width {
                out.push('0');
            }
            out.push_str(digits);
            Ok(())
        }
        Some(spec) => {
            pad(out, body, &spec, '>');
            Ok(())
        }
        None => {
            out.push_str(body);
            Ok(())
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::Int(v as i64)
            }
        }
    )*};
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(v: usize) -> Value {
        // Falls back to Float when the value does not fit i64.
        match i64::try_from(v) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Float(v as f64),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::List(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Value {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Value {
        Value::List(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Value {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Builds an object value from key/value pairs.
pub fn object(pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>) -> Value {
    pairs.into_iter().collect()
}

/// Builds a list value from items.
pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Value {
    Value::List(items.into_iter().map(Into::into).collect())
}
