/*
 * render_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end rendering tests: interpolation, sections, scope
 * behavior, partials, and output handling.
 */

use std::sync::Arc;

use pretty_assertions::assert_eq;
use whiskers::{
    list, no_escape, object, render, MemoryContext, NoContext, RenderError, Template, Value,
};

fn render_plain(source: &str, data: &Value) -> String {
    Template::compile(source).unwrap().render(data).unwrap()
}

#[test]
fn literal_text_passes_through() {
    assert_eq!(render_plain("just text", &Value::Null), "just text");
}

#[test]
fn variable_interpolation() {
    let data = object([("name", "world"), ("greeting", "hello")]);
    assert_eq!(render_plain("{{greeting}}, {{name}}!", &data), "hello, world!");
}

#[test]
fn missing_variable_renders_empty() {
    let data = object([("a", 1)]);
    assert_eq!(render_plain("[{{missing}}]", &data), "[]");
}

#[test]
fn html_escaping_applies_to_escaped_tags_only() {
    let t = Template::compile("{{x}} & {{&x}} & {{{x}}}").unwrap();
    let data = object([("x", "<b>")]);
    assert_eq!(
        t.render_html(&data, &NoContext).unwrap(),
        "&lt;b&gt; & <b> & <b>"
    );
}

#[test]
fn default_rendering_does_not_escape() {
    let data = object([("x", "<b>")]);
    assert_eq!(render_plain("{{x}}", &data), "<b>");
}

#[test]
fn bool_prints_as_words() {
    let data = object([("t", true), ("f", false)]);
    assert_eq!(render_plain("{{t}}/{{f}}", &data), "true/false");
}

#[test]
fn lists_and_objects_print_empty() {
    let data = object([("items", list([1, 2])), ("obj", object([("a", 1)]))]);
    assert_eq!(render_plain("[{{items}}][{{obj}}]", &data), "[][]");
}

#[test]
fn keys_may_contain_spaces() {
    let data = object([("has space", "yes")]);
    assert_eq!(render_plain("{{has space}}", &data), "yes");
}

#[test]
fn section_enters_object_scope() {
    let data = object([("user", object([("name", "amy")]))]);
    assert_eq!(
        render_plain("{{#user}}{{name}}{{/user}}", &data),
        "amy"
    );
}

#[test]
fn section_falls_through_to_outer_scope() {
    let data = object([("section", object([("a", 1)])), ("b", Value::Int(2))]);
    assert_eq!(
        render_plain("{{#section}}{{a}}{{b}}{{/section}}", &data),
        "12"
    );
}

#[test]
fn present_null_shadows_outer_binding() {
    let data = object([
        ("section", object([("b", Value::Null)])),
        ("b", Value::Int(2)),
    ]);
    assert_eq!(render_plain("{{#section}}[{{b}}]{{/section}}", &data), "[]");
}

#[test]
fn section_on_bool() {
    let data = object([("ok", true)]);
    assert_eq!(render_plain("{{#ok}}YES{{/ok}}", &data), "YES");
    let data = object([("ok", false)]);
    assert_eq!(render_plain("{{#ok}}YES{{/ok}}", &data), "");
}

#[test]
fn section_iterates_lists() {
    let data = object([("items", list([1, 2, 3]))]);
    assert_eq!(
        render_plain("{{#items}}({{.}}){{/items}}", &data),
        "(1)(2)(3)"
    );
}

#[test]
fn section_over_object_list() {
    let data = object([(
        "people",
        list([object([("name", "amy")]), object([("name", "bob")])]),
    )]);
    assert_eq!(
        render_plain("{{#people}}{{name}};{{/people}}", &data),
        "amy;bob;"
    );
}

#[test]
fn empty_list_section_is_skipped() {
    let data = object([("items", list(Vec::<Value>::new()))]);
    assert_eq!(render_plain("{{#items}}x{{/items}}", &data), "");
}

#[test]
fn inversion_renders_on_falsy() {
    let data = object([("items", list(Vec::<Value>::new()))]);
    assert_eq!(render_plain("{{^items}}none{{/items}}", &data), "none");
    let data = object([("items", list([1]))]);
    assert_eq!(render_plain("{{^items}}none{{/items}}", &data), "");
}

#[test]
fn inversion_on_missing_renders() {
    let data = object([("a", 1)]);
    assert_eq!(render_plain("{{^missing}}gone{{/missing}}", &data), "gone");
}

#[test]
fn inversion_on_cursor_inside_list() {
    let data = object([("items", list([1]))]);
    assert_eq!(
        render_plain("{{#items}}{{^.}}empty{{/.}}{{/items}}", &data),
        ""
    );
}

#[test]
fn dotted_path_resolution() {
    let data = object([("a", object([("b", object([("c", 42)]))]))]);
    assert_eq!(render_plain("{{a.b.c}}", &data), "42");
}

#[test]
fn broken_dotted_path_renders_empty() {
    let data = object([("a", 1)]);
    assert_eq!(render_plain("[{{a.x.y}}]", &data), "[]");
}

#[test]
fn leading_dot_descends_from_cursor() {
    let data = object([
        ("user", object([("name", "inner")])),
        ("name", Value::from("outer")),
    ]);
    assert_eq!(
        render_plain("{{#user}}{{.name}}{{/user}}", &data),
        "inner"
    );
}

#[test]
fn dot_renders_the_cursor_itself() {
    assert_eq!(render_plain("n={{.}}", &Value::Int(7)), "n=7");
}

#[test]
fn atom_section_keeps_the_cursor() {
    // Entering an atom section moves neither scope nor cursor.
    let data = object([("n", 7)]);
    assert_eq!(render_plain("{{#n}}[{{.}}]{{/n}}", &data), "[]");
}

#[test]
fn section_close_alias() {
    let data = object([("items", list([1, 2]))]);
    assert_eq!(render_plain("{{#x:items}}{{.}}{{/x}}", &data), "12");
}

#[test]
fn format_specs() {
    let data = object([
        ("num", Value::Int(42)),
        ("b", Value::Bool(true)),
        ("f", Value::Float(3.14159)),
        ("s", Value::from("hello")),
        ("name", Value::from("test")),
    ]);
    assert_eq!(render_plain("{{num:05}}", &data), "00042");
    assert_eq!(render_plain("{{b:8}}|", &data), "true    |");
    assert_eq!(render_plain("{{num:8}}|", &data), "      42|");
    assert_eq!(render_plain("{{f:.2f}}", &data), "3.14");
    assert_eq!(render_plain("{{s:*>10}}", &data), "*****hello");
    assert_eq!(render_plain("{{name:*^10}}", &data), "***test***");
}

#[test]
fn comments_are_dropped() {
    let data = object([("a", 1)]);
    assert_eq!(render_plain("x{{! ignore {{a}} fully }}y", &data), "xy");
}

#[test]
fn standalone_comment_line_disappears() {
    assert_eq!(render_plain("a\n{{! note }}\nb", &Value::Null), "a\nb");
}

#[test]
fn set_delimiters() {
    let data = object([("x", 1), ("y", 2)]);
    assert_eq!(
        render_plain("{{x}} {{=<% %>=}}<%y%>", &data),
        "1 2"
    );
}

#[test]
fn standalone_section_lines_leave_no_blank_lines() {
    let data = object([("items", list(["a", "b"]))]);
    assert_eq!(
        render_plain("{{#items}}\n{{.}}\n{{/items}}\n", &data),
        "a\nb\n"
    );
}

#[test]
fn basic_partial() {
    let partials = MemoryContext::with_partials([("greet", "hi {{name}}")]).unwrap();
    let t = Template::compile("<{{>greet}}>").unwrap();
    let data = object([("name", "amy")]);
    assert_eq!(t.render_with(&data, &partials).unwrap(), "<hi amy>");
}

#[test]
fn partial_sees_enclosing_scope() {
    let partials = MemoryContext::with_partials([("card", "[{{name}}]")]).unwrap();
    let t = Template::compile("{{#user}}{{>card}}{{/user}}").unwrap();
    let data = object([("user", object([("name", "amy")]))]);
    assert_eq!(t.render_with(&data, &partials).unwrap(), "[amy]");
}

#[test]
fn partial_renders_under_the_scope_of_each_call_site() {
    let partials = MemoryContext::with_partials([("p", "{{value}}")]).unwrap();
    let t = Template::compile("{{#s}}{{>p}}{{/s}}{{>p}}").unwrap();
    let data = object([
        ("s", object([("value", "in")])),
        ("value", Value::from("out")),
    ]);
    assert_eq!(t.render_with(&data, &partials).unwrap(), "inout");
}

#[test]
fn missing_partial_renders_nothing() {
    let t = Template::compile("a{{>absent}}b").unwrap();
    assert_eq!(t.render(&Value::Null).unwrap(), "ab");
}

#[test]
fn standalone_partial_indents_every_line() {
    let partials = MemoryContext::with_partials([("items", "a\nb\n")]).unwrap();
    let t = Template::compile("list:\n  {{>items}}\nend\n").unwrap();
    assert_eq!(
        t.render_with(&Value::Null, &partials).unwrap(),
        "list:\n  a\n  b\nend\n"
    );
}

#[test]
fn indentation_is_not_injected_into_interpolated_values() {
    let partials = MemoryContext::with_partials([("p", "|\n{{{content}}}\n|\n")]).unwrap();
    let t = Template::compile("\\\n {{>p}}\n/\n").unwrap();
    let data = object([("content", "<\n->")]);
    assert_eq!(
        t.render_with(&data, &partials).unwrap(),
        "\\\n |\n <\n->\n |\n/\n"
    );
}

#[test]
fn nested_partial_indentation_accumulates() {
    let partials =
        MemoryContext::with_partials([("outer", "o\n  {{>inner}}\n"), ("inner", "i\n")])
            .unwrap();
    let t = Template::compile("  {{>outer}}\n").unwrap();
    assert_eq!(
        t.render_with(&Value::Null, &partials).unwrap(),
        "  o\n    i\n"
    );
}

#[test]
fn dynamic_partial_name() {
    let partials = MemoryContext::with_partials([("greet", "hello")]).unwrap();
    let t = Template::compile("{{>*which}}").unwrap();
    let data = object([("which", "greet")]);
    assert_eq!(t.render_with(&data, &partials).unwrap(), "hello");
}

#[test]
fn dynamic_partial_target_sees_the_resolving_scope() {
    let partials =
        MemoryContext::with_partials([("greeting", "Hello {{name}}!")]).unwrap();
    let t = Template::compile("{{>*t}}").unwrap();
    let data = object([("t", "greeting"), ("name", "World")]);
    assert_eq!(t.render_with(&data, &partials).unwrap(), "Hello World!");
}

#[test]
fn unresolved_dynamic_partial_renders_nothing() {
    let partials = MemoryContext::with_partials([("greet", "hello")]).unwrap();
    let t = Template::compile("a{{>*which}}b").unwrap();
    assert_eq!(t.render_with(&Value::Null, &partials).unwrap(), "ab");
}

#[test]
fn unresolved_handler_substitutes_values() {
    let t = Template::compile("{{a}}-{{b.c}}").unwrap();
    let data = object([("b", object([("x", 1)]))]);
    let handler =
        |name: &str| -> Result<Value, RenderError> { Ok(Value::String(format!("<{name}>"))) };
    let mut out = String::new();
    render(&mut out, no_escape, &t, &data, &NoContext, Some(&handler)).unwrap();
    assert_eq!(out, "<a>-<c>");
}

#[test]
fn unresolved_handler_error_keeps_partial_output() {
    let t = Template::compile("before-{{x}}-after").unwrap();
    let handler = |name: &str| -> Result<Value, RenderError> {
        Err(RenderError::Unresolved {
            name: name.to_string(),
        })
    };
    let mut out = String::new();
    let err = render(
        &mut out,
        no_escape,
        &t,
        &Value::Null,
        &NoContext,
        Some(&handler),
    )
    .unwrap_err();
    assert_eq!(out, "before-");
    assert_eq!(err.to_string(), "unresolved variable: x");
}

#[test]
fn handler_is_not_consulted_for_sections() {
    let t = Template::compile("{{#missing}}x{{/missing}}done").unwrap();
    let handler = |name: &str| -> Result<Value, RenderError> {
        panic!("handler called for section key {name}")
    };
    let mut out = String::new();
    render(
        &mut out,
        no_escape,
        &t,
        &Value::Null,
        &NoContext,
        Some(&handler),
    )
    .unwrap();
    assert_eq!(out, "done");
}

#[test]
fn render_to_writer() {
    let t = Template::compile("n={{n}}").unwrap();
    let data = object([("n", 5)]);
    let out = t.render_to_writer(&data, Vec::new()).unwrap();
    assert_eq!(out, b"n=5");
}

#[test]
fn rendering_is_idempotent() {
    let t = Template::compile("{{#items}}{{.}}.{{/items}}").unwrap();
    let data = object([("items", list([1, 2]))]);
    let first = t.render(&data).unwrap();
    let second = t.render(&data).unwrap();
    assert_eq!(first, "1.2.");
    assert_eq!(first, second);
}

#[test]
fn shared_template_renders_concurrently() {
    let template = Arc::new(Template::compile("{{#items}}{{.}},{{/items}}").unwrap());
    let data = Arc::new(object([("items", list([1, 2, 3]))]));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let template = Arc::clone(&template);
            let data = Arc::clone(&data);
            std::thread::spawn(move || template.render(&data).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "1,2,3,");
    }
}
