use htmlsax::{
    Attributes, EventCollector, EventContext, Handler, HandlerResult, Lifecycle, Parser,
    ParserError, ParserOptions, parse_document,
};
use std::fmt::Write as _;

/// Re-serializes the event stream, writing implied end tags explicitly.
#[derive(Default)]
struct Serializer {
    out: String,
}

impl Handler for Serializer {
    fn on_open_tag(
        &mut self,
        _cx: &mut EventContext,
        name: &str,
        attributes: &Attributes,
        _implied: bool,
    ) -> HandlerResult {
        write!(self.out, "<{name}")?;
        for (key, value) in attributes.iter() {
            write!(self.out, " {key}=\"{value}\"")?;
        }
        self.out.push('>');
        Ok(())
    }

    fn on_text(&mut self, _cx: &mut EventContext, text: &str) -> HandlerResult {
        self.out.push_str(text);
        Ok(())
    }

    fn on_close_tag(&mut self, _cx: &mut EventContext, name: &str, _implied: bool) -> HandlerResult {
        write!(self.out, "</{name}>")?;
        Ok(())
    }
}

/// Pauses after every completed open tag.
#[derive(Default)]
struct Stepper {
    opens: Vec<String>,
    ended: bool,
}

impl Handler for Stepper {
    fn on_open_tag(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        _attributes: &Attributes,
        _implied: bool,
    ) -> HandlerResult {
        self.opens.push(name.to_string());
        cx.pause();
        Ok(())
    }

    fn on_end(&mut self, _cx: &mut EventContext) -> HandlerResult {
        self.ended = true;
        Ok(())
    }
}

/// Records only errors.
#[derive(Default)]
struct Errors {
    seen: Vec<ParserError>,
}

impl Handler for Errors {
    fn on_error(&mut self, error: ParserError) {
        self.seen.push(error);
    }
}

#[test]
fn serializer_sees_implied_end_tags() {
    let out = parse_document(
        Serializer::default(),
        "<ul><li class=x>a<li>b</ul>",
        ParserOptions::default(),
    )
    .out;
    assert_eq!(out, r#"<ul><li class="x">a</li><li>b</li></ul>"#);
}

#[test]
fn stepping_through_a_document_one_tag_at_a_time() {
    let mut parser = Parser::new(Stepper::default(), ParserOptions::default());
    parser.end_with("<a><b><c>");
    assert_eq!(parser.handler().opens, ["a"]);
    assert_eq!(parser.lifecycle(), Lifecycle::Done);
    assert!(parser.is_paused());

    let mut resumes = 0;
    while !parser.handler().ended {
        parser.resume();
        resumes += 1;
        assert!(resumes <= 3, "parser never finished");
    }
    assert_eq!(resumes, 3);
    assert_eq!(parser.handler().opens, ["a", "b", "c"]);
    assert!(parser.open_elements().next().is_none());
}

#[test]
fn end_while_paused_finishes_on_resume() {
    let mut parser = Parser::new(EventCollector::new(), ParserOptions::default());
    assert_eq!(parser.lifecycle(), Lifecycle::Idle);
    parser.write("<a>");
    assert_eq!(parser.lifecycle(), Lifecycle::Writing);
    parser.pause();
    assert_eq!(parser.lifecycle(), Lifecycle::Paused);
    parser.write("x");
    parser.end();
    assert_eq!(parser.lifecycle(), Lifecycle::Done);
    assert_eq!(
        parser.handler().lines(),
        [r#"open_tag_name "a" @0..=2"#, r#"open_tag "a" {} @0..=2"#]
    );

    parser.resume();
    assert!(!parser.is_paused());
    assert_eq!(
        parser.handler().lines()[2..],
        [
            r#"text "x" @3..=3"#,
            r#"close_tag "a" implied @4..=4"#,
            "end @4..=4",
        ]
    );
}

#[test]
fn writes_after_end_are_reported_even_while_paused() {
    let mut parser = Parser::new(Errors::default(), ParserOptions::default());
    parser.write("<a>");
    parser.pause();
    parser.end();
    parser.write("<b>");
    parser.write_bytes(b"<c>");
    parser.end();
    let seen: Vec<String> = parser.handler().seen.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        seen,
        [".write() after done!", ".write() after done!", ".end() after done!"]
    );
    assert!(parser.handler().seen.iter().all(ParserError::is_lifecycle));
}

#[test]
fn empty_writes_emit_nothing() {
    let mut parser = Parser::new(EventCollector::new(), ParserOptions::default());
    parser.write("");
    parser.write_bytes(&[]);
    parser.write("a");
    parser.write("");
    parser.end();
    assert_eq!(parser.handler().lines(), [r#"text "a" @0..=0"#, "end @1..=1"]);
}

#[test]
fn reset_parser_matches_a_fresh_one() {
    let input = "<p>one<p>two &amp; <b>three";
    let fresh = parse_document(EventCollector::new(), input, ParserOptions::default()).lines();

    let mut parser = Parser::new(EventCollector::new(), ParserOptions::default());
    parser.write("<div><span>unfinished");
    parser.pause();
    parser.write("<queued>");
    parser.reset();
    assert_eq!(parser.lifecycle(), Lifecycle::Idle);
    parser.handler_mut().clear();
    parser.end_with(input);
    assert_eq!(parser.handler().lines(), fresh);

    parser.handler_mut().clear();
    parser.parse_complete(input);
    assert_eq!(parser.handler().lines(), fresh);
}

#[test]
fn explicit_flags_override_mode_defaults() {
    let options = ParserOptions::xml().lower_case_tags(true);
    let parser = Parser::new(EventCollector::new(), options.clone());
    assert!(parser.options().xml_mode);
    assert!(parser.options().lower_case_tags);
    assert!(!parser.options().lower_case_attribute_names);

    let lines = parse_document(EventCollector::new(), r#"<A B="1"/>"#, options).lines();
    assert_eq!(
        lines,
        [
            r#"open_tag_name "a" @0..=2"#,
            r#"attribute "B" "1" double @3..=7"#,
            r#"open_tag "a" {B="1"} @0..=9"#,
            r#"close_tag "a" implied @0..=9"#,
            "end @10..=10",
        ]
    );
}
