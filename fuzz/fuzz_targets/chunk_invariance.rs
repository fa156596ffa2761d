#![no_main]

use htmlsax::{Event, EventCollector, Parser, ParserOptions, RecordedEvent};
use htmlsax_test_support::diff_lines;
use libfuzzer_sys::fuzz_target;

// First byte picks options and a split stride; the rest is the document.
fuzz_target!(|data: &[u8]| {
    let Some((&control, bytes)) = data.split_first() else {
        return;
    };
    let options = ParserOptions {
        xml_mode: control & 0x01 != 0,
        recognize_cdata: (control & 0x02 != 0).then_some(true),
        recognize_self_closing: (control & 0x04 != 0).then_some(true),
        decode_entities: (control & 0x08 != 0).then_some(false),
        ..ParserOptions::default()
    };
    let stride = usize::from(control >> 4) + 1;

    let mut whole = Parser::new(EventCollector::new(), options.clone());
    whole.write_bytes(bytes);
    whole.end();
    let whole = whole.into_handler();

    let len = match whole.events().last() {
        Some(RecordedEvent {
            event: Event::End,
            position: Some((start, _)),
        }) => *start,
        other => panic!("stream did not finish with end: {other:?}"),
    };
    for recorded in whole.events() {
        if let Some((start, end)) = recorded.position {
            assert!(start <= end, "inverted range: {recorded}");
            assert!(end <= len, "range past the stream: {recorded}");
        }
    }

    let mut chunked = Parser::new(EventCollector::new(), options);
    for chunk in bytes.chunks(stride) {
        chunked.write_bytes(chunk);
    }
    chunked.end();

    let expected = whole.lines();
    let actual = chunked.into_handler().lines();
    if expected != actual {
        panic!("stride {stride}:\n{}", diff_lines(&expected, &actual));
    }
});
