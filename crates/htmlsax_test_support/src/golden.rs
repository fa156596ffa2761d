//! Runners that replay golden cases through the parser.

use htmlsax::{Event, EventCollector, Parser, ParserOptions, QuoteKind, RecordedEvent};
use serde_json::{Value, json};

use crate::chunker::{BoundaryPolicy, ChunkPlan, build_chunk_plans, shrink_plan};
use crate::fixtures::{FixtureOptions, GoldenCase};
use crate::{diff_lines, escape_text};

impl From<&FixtureOptions> for ParserOptions {
    fn from(options: &FixtureOptions) -> Self {
        ParserOptions {
            xml_mode: options.xml_mode,
            decode_entities: options.decode_entities,
            lower_case_tags: options.lower_case_tags,
            lower_case_attribute_names: options.lower_case_attribute_names,
            recognize_cdata: options.recognize_cdata,
            recognize_self_closing: options.recognize_self_closing,
        }
    }
}

/// Event lines for `input` written in one piece.
pub fn run_whole(input: &str, options: &ParserOptions) -> Vec<String> {
    let mut parser = Parser::new(EventCollector::new(), options.clone());
    parser.end_with(input);
    parser.into_handler().lines()
}

/// Event lines for `input` fed through `write_bytes` according to `plan`.
pub fn run_chunked(input: &str, options: &ParserOptions, plan: &ChunkPlan) -> Vec<String> {
    let mut parser = Parser::new(EventCollector::new(), options.clone());
    plan.for_each_chunk(input, |chunk| parser.write_bytes(chunk));
    parser.end();
    parser.into_handler().lines()
}

/// Check a case whole and, unless disabled, under every chunk plan. Failures
/// report the shrunk plan.
pub fn check_case(case: &GoldenCase, fuzz_runs: usize, fuzz_seed: u64) -> Result<(), String> {
    let options = ParserOptions::from(&case.options);
    let actual = run_whole(&case.input, &options);
    if actual != case.expected {
        return Err(format!(
            "case '{}' (whole input \"{}\"):\n{}",
            case.name,
            escape_text(&case.input),
            diff_lines(&case.expected, &actual)
        ));
    }
    if !case.chunked {
        return Ok(());
    }
    for policy in [BoundaryPolicy::Utf8Aligned, BoundaryPolicy::ByteStream] {
        for plan_case in build_chunk_plans(&case.input, fuzz_runs, fuzz_seed, policy) {
            let actual = run_chunked(&case.input, &options, &plan_case.plan);
            if actual == case.expected {
                continue;
            }
            let shrunk = shrink_plan(&case.input, &plan_case.plan, |plan| {
                run_chunked(&case.input, &options, plan) != case.expected
            });
            let actual = run_chunked(&case.input, &options, &shrunk);
            return Err(format!(
                "case '{}' under {} (shrunk to {shrunk}):\n{}",
                case.name,
                plan_case.label,
                diff_lines(&case.expected, &actual)
            ));
        }
    }
    Ok(())
}

/// Structured form of one recorded event, for fixture-authoring dumps.
pub fn event_json(recorded: &RecordedEvent) -> Value {
    let mut value = match &recorded.event {
        Event::ParserInit => json!({ "type": "parser_init" }),
        Event::Reset => json!({ "type": "reset" }),
        Event::OpenTagName(name) => json!({ "type": "open_tag_name", "name": name }),
        Event::Attribute { name, value, quote } => json!({
            "type": "attribute",
            "name": name,
            "value": value,
            "quote": quote.map(|quote| match quote {
                QuoteKind::Double => "\"",
                QuoteKind::Single => "'",
                QuoteKind::Unquoted => "",
            }),
        }),
        Event::OpenTag {
            name,
            attributes,
            implied,
        } => json!({
            "type": "open_tag",
            "name": name,
            "attributes": attributes,
            "implied": implied,
        }),
        Event::Text(text) => json!({ "type": "text", "data": text }),
        Event::CloseTag { name, implied } => {
            json!({ "type": "close_tag", "name": name, "implied": implied })
        }
        Event::Comment(text) => json!({ "type": "comment", "data": text }),
        Event::CommentEnd => json!({ "type": "comment_end" }),
        Event::CdataStart => json!({ "type": "cdata_start" }),
        Event::Cdata(text) => json!({ "type": "cdata", "data": text }),
        Event::CdataEnd => json!({ "type": "cdata_end" }),
        Event::ProcessingInstruction { name, data } => {
            json!({ "type": "processing_instruction", "name": name, "data": data })
        }
        Event::End => json!({ "type": "end" }),
        Event::Error(message) => json!({ "type": "error", "message": message }),
    };
    if let (Some((start, end)), Some(object)) = (recorded.position, value.as_object_mut()) {
        object.insert("start_index".into(), json!(start));
        object.insert("end_index".into(), json!(end));
    }
    value
}

/// Pretty JSON array of every event `input` produces.
pub fn dump_events_json(input: &str, options: &ParserOptions) -> String {
    let mut parser = Parser::new(EventCollector::new(), options.clone());
    parser.end_with(input);
    let events: Vec<Value> = parser.handler().events().iter().map(event_json).collect();
    serde_json::to_string_pretty(&events).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}
