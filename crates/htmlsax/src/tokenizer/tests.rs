use super::{Flow, LexicalSink, QuoteKind, Tokenize, Tokenizer};
use crate::options::TokenizerOptions;
use crate::span::Span;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Ev {
    Text(String),
    OpenName(usize, String),
    AttrName(String),
    AttrData(String),
    AttrEnd(Option<QuoteKind>, usize),
    OpenEnd(usize),
    SelfClosing(usize),
    Close(Span, String),
    Comment(Span, String),
    Cdata(Span, String),
    Declaration(String),
    Pi(String),
    End(usize),
}

/// Records units, merging adjacent text and attribute-data fragments.
#[derive(Default)]
struct Recorder {
    events: Vec<Ev>,
    text_spans: Vec<Span>,
    pause_on_open: bool,
    abandon_on_open: bool,
}

impl Recorder {
    fn push(&mut self, ev: Ev) -> Flow {
        match (self.events.last_mut(), &ev) {
            (Some(Ev::Text(prev)), Ev::Text(next)) => prev.push_str(next),
            (Some(Ev::AttrData(prev)), Ev::AttrData(next)) => prev.push_str(next),
            _ => self.events.push(ev),
        }
        Flow::Continue
    }
}

impl LexicalSink for Recorder {
    fn on_text(&mut self, span: Span, text: &str) -> Flow {
        self.text_spans.push(span);
        self.push(Ev::Text(text.to_string()))
    }

    fn on_open_tag_name(&mut self, tag_start: usize, _span: Span, name: &str) -> Flow {
        self.push(Ev::OpenName(tag_start, name.to_string()));
        if self.abandon_on_open {
            Flow::Abandon
        } else if self.pause_on_open {
            Flow::Pause
        } else {
            Flow::Continue
        }
    }

    fn on_attribute_name(&mut self, _span: Span, name: &str) -> Flow {
        self.push(Ev::AttrName(name.to_string()))
    }

    fn on_attribute_data(&mut self, _span: Span, data: &str) -> Flow {
        self.push(Ev::AttrData(data.to_string()))
    }

    fn on_attribute_end(&mut self, quote: Option<QuoteKind>, end: usize) -> Flow {
        self.push(Ev::AttrEnd(quote, end))
    }

    fn on_open_tag_end(&mut self, gt: usize) -> Flow {
        self.push(Ev::OpenEnd(gt))
    }

    fn on_self_closing_tag(&mut self, gt: usize) -> Flow {
        self.push(Ev::SelfClosing(gt))
    }

    fn on_close_tag(&mut self, span: Span, name: &str) -> Flow {
        self.push(Ev::Close(span, name.to_string()))
    }

    fn on_comment(&mut self, span: Span, body: &str) -> Flow {
        self.push(Ev::Comment(span, body.to_string()))
    }

    fn on_cdata(&mut self, span: Span, body: &str) -> Flow {
        self.push(Ev::Cdata(span, body.to_string()))
    }

    fn on_declaration(&mut self, _span: Span, body: &str) -> Flow {
        self.push(Ev::Declaration(body.to_string()))
    }

    fn on_processing_instruction(&mut self, _span: Span, body: &str) -> Flow {
        self.push(Ev::Pi(body.to_string()))
    }

    fn on_end(&mut self, end: usize) {
        self.push(Ev::End(end));
    }
}

fn html() -> TokenizerOptions {
    TokenizerOptions {
        xml_mode: false,
        decode_entities: true,
    }
}

fn xml() -> TokenizerOptions {
    TokenizerOptions {
        xml_mode: true,
        decode_entities: true,
    }
}

fn run_chunks(options: TokenizerOptions, chunks: &[&str]) -> Vec<Ev> {
    let mut tokenizer = Tokenizer::new(options);
    let mut sink = Recorder::default();
    for chunk in chunks {
        tokenizer.write(chunk, &mut sink);
    }
    tokenizer.end(&mut sink);
    sink.events
}

fn run(options: TokenizerOptions, input: &str) -> Vec<Ev> {
    run_chunks(options, &[input])
}

fn text(s: &str) -> Ev {
    Ev::Text(s.to_string())
}

#[test]
fn tokenizes_tag_attribute_text_and_end_tag() {
    assert_eq!(
        run(html(), "<div id=\"a\">hi</div>"),
        vec![
            Ev::OpenName(0, "div".into()),
            Ev::AttrName("id".into()),
            Ev::AttrData("a".into()),
            Ev::AttrEnd(Some(QuoteKind::Double), 11),
            Ev::OpenEnd(11),
            text("hi"),
            Ev::Close(Span::new(14, 20), "div".into()),
            Ev::End(20),
        ]
    );
}

#[test]
fn attribute_forms() {
    assert_eq!(
        run(html(), "<a b c='1' d=2 e>"),
        vec![
            Ev::OpenName(0, "a".into()),
            Ev::AttrName("b".into()),
            Ev::AttrEnd(None, 4),
            Ev::AttrName("c".into()),
            Ev::AttrData("1".into()),
            Ev::AttrEnd(Some(QuoteKind::Single), 10),
            Ev::AttrName("d".into()),
            Ev::AttrData("2".into()),
            Ev::AttrEnd(Some(QuoteKind::Unquoted), 14),
            Ev::AttrName("e".into()),
            Ev::AttrEnd(None, 16),
            Ev::OpenEnd(16),
            Ev::End(17),
        ]
    );
}

#[test]
fn self_closing_syntax_is_reported() {
    assert_eq!(
        run(xml(), "<br/>"),
        vec![
            Ev::OpenName(0, "br".into()),
            Ev::SelfClosing(4),
            Ev::End(5)
        ]
    );
}

#[test]
fn names_are_reported_as_written() {
    let events = run(html(), "<DiV></DIV>");
    assert_eq!(events[0], Ev::OpenName(0, "DiV".into()));
    assert_eq!(events[2], Ev::Close(Span::new(5, 11), "DIV".into()));
}

#[test]
fn lone_angle_brackets_are_text() {
    assert_eq!(
        run(html(), "a < b <3 c"),
        vec![text("a < b <3 c"), Ev::End(10)]
    );
    assert_eq!(run(html(), "</>x"), vec![text("x"), Ev::End(4)]);
}

#[test]
fn character_references_decode_in_text_and_attributes() {
    assert_eq!(
        run(html(), "a&amp;b &lt;<i t=\"&quot;x&quot;\">"),
        vec![
            text("a&b <"),
            Ev::OpenName(12, "i".into()),
            Ev::AttrName("t".into()),
            Ev::AttrData("\"x\"".into()),
            Ev::AttrEnd(Some(QuoteKind::Double), 32),
            Ev::OpenEnd(32),
            Ev::End(33),
        ]
    );
}

#[test]
fn reference_text_fragments_cover_the_raw_source() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder::default();
    tokenizer.write("x&amp;y", &mut sink);
    tokenizer.end(&mut sink);
    assert_eq!(
        sink.text_spans,
        vec![Span::new(0, 1), Span::new(1, 6), Span::new(6, 7)]
    );
}

#[test]
fn decoding_can_be_disabled() {
    let options = TokenizerOptions {
        xml_mode: false,
        decode_entities: false,
    };
    assert_eq!(run(options, "&amp;"), vec![text("&amp;"), Ev::End(5)]);
}

#[test]
fn invalid_numeric_references_stay_literal() {
    assert_eq!(
        run(html(), "id=770&#anchor"),
        vec![text("id=770&#anchor"), Ev::End(14)]
    );
    assert_eq!(run(html(), "0&#xn"), vec![text("0&#xn"), Ev::End(5)]);
}

#[test]
fn attribute_legacy_reference_before_equals_stays_literal() {
    let events = run(html(), "<a href=\"?x=1&copy=2\">");
    assert!(events.contains(&Ev::AttrData("?x=1&copy=2".into())));
    let events = run(html(), "<a href=\"&copy 2\">");
    assert!(events.contains(&Ev::AttrData("\u{A9} 2".into())));
}

#[test]
fn xml_mode_only_knows_predefined_references() {
    assert_eq!(
        run(xml(), "&amp;&nbsp;&amp"),
        vec![text("&&nbsp;&amp"), Ev::End(15)]
    );
}

#[test]
fn script_body_is_raw_text() {
    assert_eq!(
        run(html(), "<script>if (a<b) x=\"</div>\"</script>"),
        vec![
            Ev::OpenName(0, "script".into()),
            Ev::OpenEnd(7),
            text("if (a<b) x=\"</div>\""),
            Ev::Close(Span::new(27, 36), "script".into()),
            Ev::End(36),
        ]
    );
}

#[test]
fn raw_text_end_tag_must_be_delimited() {
    let events = run(html(), "<style></styles></STYLE >");
    assert_eq!(events[2], text("</styles>"));
    assert_eq!(events[3], Ev::Close(Span::new(16, 25), "STYLE".into()));
}

#[test]
fn title_decodes_references_but_keeps_tags_as_text() {
    let events = run(html(), "<title>a &amp; <b></title>");
    assert_eq!(events[2], text("a & <b>"));
}

#[test]
fn xml_mode_has_no_raw_text_elements() {
    let events = run(xml(), "<script><b/></script>");
    assert_eq!(events[2], Ev::OpenName(8, "b".into()));
}

#[test]
fn self_closed_script_does_not_swallow_the_document() {
    let events = run(html(), "<script/><b>");
    assert_eq!(events[2], Ev::OpenName(9, "b".into()));
}

#[test]
fn comments_cdata_declarations_and_instructions() {
    assert_eq!(
        run(
            html(),
            "<!-- x --><!--><![CDATA[a]]]><!DOCTYPE html><?xml v?></3>"
        ),
        vec![
            Ev::Comment(Span::new(0, 10), " x ".into()),
            Ev::Comment(Span::new(10, 15), String::new()),
            Ev::Cdata(Span::new(15, 29), "a]".into()),
            Ev::Declaration("DOCTYPE html".into()),
            Ev::Pi("xml v?".into()),
            Ev::Comment(Span::new(53, 57), "3".into()),
            Ev::End(57),
        ]
    );
}

#[test]
fn comment_may_close_with_extra_dashes() {
    assert_eq!(
        run(html(), "<!-- a --->"),
        vec![Ev::Comment(Span::new(0, 11), " a -".into()), Ev::End(11)]
    );
}

#[test]
fn non_cdata_bracket_is_a_declaration() {
    assert_eq!(
        run(html(), "<![if x]>"),
        vec![Ev::Declaration("[if x]".into()), Ev::End(9)]
    );
}

#[test]
fn unterminated_markup_degrades_to_text() {
    assert_eq!(run(html(), "a<!-- b"), vec![text("a<!-- b"), Ev::End(7)]);
    assert_eq!(run(html(), "a<div"), vec![text("a<div"), Ev::End(5)]);
    assert_eq!(run(html(), "</p"), vec![text("</p"), Ev::End(3)]);
    assert_eq!(run(html(), "<![CDATA[x"), vec![text("<![CDATA[x"), Ev::End(10)]);
    assert_eq!(run(html(), "a&am"), vec![text("a&am"), Ev::End(4)]);
}

#[test]
fn open_tag_cut_by_end_of_input_is_completed() {
    assert_eq!(
        run(html(), "<a href=\"x"),
        vec![
            Ev::OpenName(0, "a".into()),
            Ev::AttrName("href".into()),
            Ev::AttrData("x".into()),
            Ev::AttrEnd(Some(QuoteKind::Double), 10),
            Ev::OpenEnd(9),
            Ev::End(10),
        ]
    );
}

const CHUNK_CASES: &[&str] = &[
    "<div id=\"a\" class='b c' data-x=1 hidden>hi &amp; bye</div>",
    "x &notit; &notin; &#x41;&#65 &hellip; &bogus; &",
    "<script>var s = '</scr' + 'ipt>'; a < b</script>tail",
    "<textarea>&lt;b&gt;</textarea><style>p{}</style >",
    "<!-- c --><!--><!---><![CDATA[x]]><!DOCTYPE html><?pi a?></3>",
    "<a href=\"?a=1&amp;b=2&copy=3\">caf\u{e9} \u{1F600}</a>",
    "<p>one<p>two</p></x><br/>",
];

#[test]
fn every_split_point_yields_the_same_units() {
    for options in [html(), xml()] {
        for input in CHUNK_CASES {
            let whole = run(options, input);
            for split in 1..input.len() {
                if !input.is_char_boundary(split) {
                    continue;
                }
                let (a, b) = input.split_at(split);
                assert_eq!(
                    run_chunks(options, &[a, b]),
                    whole,
                    "split at {split} of {input:?}"
                );
            }
        }
    }
}

#[test]
fn single_byte_chunks_yield_the_same_units() {
    for input in CHUNK_CASES {
        let whole = run(html(), input);
        let chunks: Vec<&str> = input
            .char_indices()
            .map(|(i, ch)| &input[i..i + ch.len_utf8()])
            .collect();
        assert_eq!(run_chunks(html(), &chunks), whole, "{input:?}");
    }
}

#[test]
fn pause_stops_before_the_next_unit_and_resume_continues() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder {
        pause_on_open: true,
        ..Recorder::default()
    };
    tokenizer.write("<a>x<b>y", &mut sink);
    assert!(!tokenizer.is_running());
    assert_eq!(sink.events, vec![Ev::OpenName(0, "a".into())]);

    sink.pause_on_open = false;
    tokenizer.resume(&mut sink);
    tokenizer.end(&mut sink);
    assert_eq!(
        sink.events,
        vec![
            Ev::OpenName(0, "a".into()),
            Ev::OpenEnd(2),
            text("x"),
            Ev::OpenName(4, "b".into()),
            Ev::OpenEnd(6),
            text("y"),
            Ev::End(8),
        ]
    );
}

#[test]
fn end_while_paused_waits_for_resume() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder::default();
    tokenizer.write("abc", &mut sink);
    tokenizer.pause();
    tokenizer.end(&mut sink);
    assert!(!tokenizer.is_finished());
    tokenizer.resume(&mut sink);
    tokenizer.end(&mut sink);
    assert!(tokenizer.is_finished());
    assert_eq!(sink.events, vec![text("abc"), Ev::End(3)]);
}

#[test]
fn abandon_drops_the_rest_of_the_scan() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder {
        abandon_on_open: true,
        ..Recorder::default()
    };
    tokenizer.write("<a href=x>tail", &mut sink);
    assert!(tokenizer.is_running());
    sink.abandon_on_open = false;
    tokenizer.write("more", &mut sink);
    tokenizer.end(&mut sink);
    assert_eq!(
        sink.events,
        vec![Ev::OpenName(0, "a".into()), text("more"), Ev::End(18)]
    );
}

#[test]
fn completed_units_are_compacted_away() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder::default();
    tokenizer.write("plain text that is fully delivered", &mut sink);
    tokenizer.write("<div cl", &mut sink);
    assert!(tokenizer.retained_len() <= "<div cl".len());
    tokenizer.write("ass=x>", &mut sink);
    assert_eq!(tokenizer.index(), 47);
    assert!(tokenizer.stats().compactions >= 1);
}

#[test]
fn reset_forgets_everything() {
    let mut tokenizer = Tokenizer::new(html());
    let mut sink = Recorder::default();
    tokenizer.write("<div", &mut sink);
    tokenizer.reset();
    tokenizer.write("x", &mut sink);
    tokenizer.end(&mut sink);
    assert_eq!(sink.events, vec![text("x"), Ev::End(1)]);
}
