//! Streaming markup tokenizer.
//!
//! The tokenizer turns arbitrarily chunked text into lexical callbacks on a
//! [`LexicalSink`]. It is an explicit state machine and is resumable at any
//! byte boundary.
//!
//! Invariants:
//! - Chunk-equivalence: the concatenation of the payloads delivered for each
//!   kind of unit does not depend on how the input was split. Text and
//!   attribute data may arrive in several fragments; every other unit arrives
//!   exactly once, complete.
//! - Retention: the tokenizer keeps only the bytes of the unit it has not
//!   finished yet (tag, comment, undecided character reference, partial
//!   raw-text end tag). Everything before that is compacted on the next write.
//! - Positions: every span is an absolute byte offset into the logical
//!   stream, independent of compaction.

use crate::entities::{self, DecodeMode, DecodeOutcome, Replacement};
use crate::options::TokenizerOptions;
use crate::span::Span;
use input::{MatchResult, is_end_of_tag_section, is_whitespace};
use states::{CommentKind, RawTextKind, TokenizerState};

mod emit;
mod input;
mod states;

#[cfg(test)]
mod tests;

/// What the sink wants the tokenizer to do after a callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Continue,
    /// Stop before the next lexical unit; buffered input is kept.
    Pause,
    /// Drop the rest of the buffered input and return to plain text.
    Abandon,
}

/// How an attribute value was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Double,
    Single,
    Unquoted,
}

impl QuoteKind {
    fn byte(self) -> u8 {
        match self {
            QuoteKind::Double => b'"',
            QuoteKind::Single => b'\'',
            QuoteKind::Unquoted => 0,
        }
    }
}

/// Receiver of lexical units.
///
/// Names are reported exactly as written; case folding is the consumer's
/// business. Spans are half-open absolute byte ranges.
pub trait LexicalSink {
    /// Character data. Decoded references arrive as their own fragment whose
    /// span covers the raw reference.
    fn on_text(&mut self, span: Span, text: &str) -> Flow;
    /// `tag_start` is the offset of the `<`.
    fn on_open_tag_name(&mut self, tag_start: usize, span: Span, name: &str) -> Flow;
    fn on_attribute_name(&mut self, span: Span, name: &str) -> Flow;
    fn on_attribute_data(&mut self, span: Span, data: &str) -> Flow;
    /// `quote` is `None` for an attribute written without a value. `end` is
    /// the exclusive end of the attribute's source.
    fn on_attribute_end(&mut self, quote: Option<QuoteKind>, end: usize) -> Flow;
    /// `gt` is the offset of the closing `>`.
    fn on_open_tag_end(&mut self, gt: usize) -> Flow;
    fn on_self_closing_tag(&mut self, gt: usize) -> Flow;
    /// `span` covers the whole end tag, `</` through `>`.
    fn on_close_tag(&mut self, span: Span, name: &str) -> Flow;
    fn on_comment(&mut self, span: Span, body: &str) -> Flow;
    fn on_cdata(&mut self, span: Span, body: &str) -> Flow;
    /// `<!...>` other than comments and CDATA; `body` excludes `<!` and `>`.
    fn on_declaration(&mut self, span: Span, body: &str) -> Flow;
    /// `<?...>`; `body` excludes `<?` and `>`.
    fn on_processing_instruction(&mut self, span: Span, body: &str) -> Flow;
    /// Called once after all input has been tokenized. `end` is the length of
    /// the logical stream.
    fn on_end(&mut self, end: usize);
}

/// The tokenizer seam the parser is generic over.
pub trait Tokenize {
    fn new(options: TokenizerOptions) -> Self
    where
        Self: Sized;
    /// Append `chunk` and scan as far as the input allows.
    fn write<S: LexicalSink>(&mut self, chunk: &str, sink: &mut S);
    /// Mark the end of input and flush trailing data. Has no effect while
    /// paused beyond recording the request; the parser calls it again after
    /// resuming.
    fn end<S: LexicalSink>(&mut self, sink: &mut S);
    fn pause(&mut self);
    fn resume<S: LexicalSink>(&mut self, sink: &mut S);
    fn reset(&mut self);
    fn is_running(&self) -> bool;
    /// True once `end` has completed and `on_end` was delivered.
    fn is_finished(&self) -> bool;
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub steps: u64,
    pub state_transitions: u64,
    pub events_emitted: u64,
    pub compactions: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Progress,
    NeedMoreInput,
}

pub struct Tokenizer {
    options: TokenizerOptions,
    state: TokenizerState,
    /// State to return to after a character reference.
    base_state: TokenizerState,
    buffer: String,
    offset: usize,
    index: usize,
    section_start: usize,
    tag_start: usize,
    body_start: usize,
    close_name_end: usize,
    attr_name_end: usize,
    raw_text: Option<RawTextKind>,
    running: bool,
    ended: bool,
    finished: bool,
    abandon: bool,
    stats: TokenizerStats,
}

impl Tokenize for Tokenizer {
    fn new(options: TokenizerOptions) -> Self {
        Tokenizer {
            options,
            state: TokenizerState::Text,
            base_state: TokenizerState::Text,
            buffer: String::new(),
            offset: 0,
            index: 0,
            section_start: 0,
            tag_start: 0,
            body_start: 0,
            close_name_end: 0,
            attr_name_end: 0,
            raw_text: None,
            running: true,
            ended: false,
            finished: false,
            abandon: false,
            stats: TokenizerStats::default(),
        }
    }

    fn write<S: LexicalSink>(&mut self, chunk: &str, sink: &mut S) {
        if self.ended {
            log::debug!(target: "htmlsax.tokenizer", "ignoring write after end");
            return;
        }
        self.compact();
        self.buffer.push_str(chunk);
        if self.running {
            self.run(sink);
        }
    }

    fn end<S: LexicalSink>(&mut self, sink: &mut S) {
        if self.finished {
            return;
        }
        self.ended = true;
        if !self.running {
            return;
        }
        // Units that were waiting for more input are decided now.
        self.run(sink);
        if !self.running {
            return;
        }
        self.handle_trailing_data(sink);
        self.finished = true;
        sink.on_end(self.end_offset());
    }

    fn pause(&mut self) {
        self.running = false;
    }

    fn resume<S: LexicalSink>(&mut self, sink: &mut S) {
        self.running = true;
        if self.has_unconsumed_input() {
            self.run(sink);
        }
    }

    fn reset(&mut self) {
        *self = Tokenizer::new(self.options);
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Tokenizer {
    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Absolute offset of the next byte to be examined.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes currently held back for an unfinished unit.
    pub fn retained_len(&self) -> usize {
        self.buffer.len()
    }

    fn run<S: LexicalSink>(&mut self, sink: &mut S) {
        while self.running && !self.abandon && self.has_unconsumed_input() {
            self.stats.steps = self.stats.steps.saturating_add(1);
            if self.step(sink) == Step::NeedMoreInput {
                break;
            }
        }
        if self.abandon {
            self.discard_buffered();
            return;
        }
        self.flush_partial(sink);
    }

    fn transition_to(&mut self, next: TokenizerState) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "htmlsax.tokenizer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                self.index
            );
        }
        self.state = next;
        self.stats.state_transitions = self.stats.state_transitions.saturating_add(1);
    }

    fn step<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        match self.state {
            TokenizerState::Text => self.step_text(sink),
            TokenizerState::BeforeTagName => self.step_before_tag_name(),
            TokenizerState::InTagName => self.step_in_tag_name(sink),
            TokenizerState::InSelfClosingTag => self.step_in_self_closing_tag(sink),
            TokenizerState::BeforeClosingTagName => self.step_before_closing_tag_name(),
            TokenizerState::InClosingTagName => self.step_in_closing_tag_name(),
            TokenizerState::AfterClosingTagName => self.step_after_closing_tag_name(sink),
            TokenizerState::BeforeAttributeName => self.step_before_attribute_name(sink),
            TokenizerState::InAttributeName => self.step_in_attribute_name(sink),
            TokenizerState::AfterAttributeName => self.step_after_attribute_name(sink),
            TokenizerState::BeforeAttributeValue => self.step_before_attribute_value(),
            TokenizerState::InAttributeValueQuoted(quote) => {
                self.step_in_attribute_value_quoted(sink, quote)
            }
            TokenizerState::InAttributeValueUnquoted => {
                self.step_in_attribute_value_unquoted(sink)
            }
            TokenizerState::BeforeDeclaration => self.step_before_declaration(),
            TokenizerState::CdataSequence => self.step_cdata_sequence(),
            TokenizerState::BeforeComment => self.step_before_comment(),
            TokenizerState::InDeclaration => self.step_in_declaration(sink),
            TokenizerState::InProcessingInstruction => self.step_in_processing_instruction(sink),
            TokenizerState::InCommentLike(kind) => self.step_in_comment_like(sink, kind),
            TokenizerState::InSpecialComment => self.step_in_special_comment(sink),
            TokenizerState::InRawText | TokenizerState::InScriptData => self.step_raw_text(sink),
            TokenizerState::InEntity => self.step_in_entity(sink),
        }
    }

    fn is_tag_start_char(&self, b: u8) -> bool {
        if self.options.xml_mode {
            !is_end_of_tag_section(b)
        } else {
            b.is_ascii_alphabetic()
        }
    }

    fn decodes_in_text(&self) -> bool {
        self.options.decode_entities
    }

    fn step_text<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let hit = if self.decodes_in_text() {
            self.find_either(b'<', b'&')
        } else {
            self.find_byte(b'<')
        };
        let Some(at) = hit else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        if self.byte_at(at) == b'&' {
            self.begin_entity(sink, at);
            return Step::Progress;
        }
        self.emit_text(sink, self.section_start, at);
        // The `<` stays in the section: if no tag follows it is plain text.
        self.section_start = at;
        self.tag_start = at;
        self.index = at + 1;
        self.transition_to(TokenizerState::BeforeTagName);
        Step::Progress
    }

    fn step_before_tag_name(&mut self) -> Step {
        let c = self.byte_at(self.index);
        match c {
            b'!' => {
                self.index += 1;
                self.body_start = self.index;
                self.transition_to(TokenizerState::BeforeDeclaration);
            }
            b'?' => {
                self.index += 1;
                self.body_start = self.index;
                self.transition_to(TokenizerState::InProcessingInstruction);
            }
            b'/' => {
                self.index += 1;
                self.transition_to(TokenizerState::BeforeClosingTagName);
            }
            c if self.is_tag_start_char(c) => {
                self.section_start = self.index;
                self.index += 1;
                self.transition_to(TokenizerState::InTagName);
            }
            _ => self.transition_to(TokenizerState::Text),
        }
        Step::Progress
    }

    fn step_in_tag_name<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(at) = self.position_from(is_end_of_tag_section) else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let name_start = self.section_start;
        let raw_text = if self.options.xml_mode {
            None
        } else {
            RawTextKind::from_name(self.slice(name_start, at))
        };
        let flow = sink.on_open_tag_name(
            self.tag_start,
            Span::new(name_start, at),
            self.slice(name_start, at),
        );
        self.note(flow);
        self.raw_text = raw_text;
        self.section_start = at;
        self.index = at;
        self.transition_to(TokenizerState::BeforeAttributeName);
        Step::Progress
    }

    fn step_before_attribute_name<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let c = self.byte_at(self.index);
        match c {
            b'>' => {
                let flow = sink.on_open_tag_end(self.index);
                self.note(flow);
                self.index += 1;
                self.section_start = self.index;
                let next = self
                    .raw_text
                    .map_or(TokenizerState::Text, RawTextKind::body_state);
                self.transition_to(next);
            }
            b'/' => {
                self.index += 1;
                self.transition_to(TokenizerState::InSelfClosingTag);
            }
            c if is_whitespace(c) => self.index += 1,
            _ => {
                self.section_start = self.index;
                self.index += 1;
                self.transition_to(TokenizerState::InAttributeName);
            }
        }
        Step::Progress
    }

    fn step_in_self_closing_tag<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let c = self.byte_at(self.index);
        if c == b'>' {
            let flow = sink.on_self_closing_tag(self.index);
            self.note(flow);
            self.index += 1;
            self.section_start = self.index;
            // A self-closed raw-text element has no body.
            self.raw_text = None;
            self.transition_to(TokenizerState::Text);
        } else if is_whitespace(c) {
            self.index += 1;
        } else {
            self.transition_to(TokenizerState::BeforeAttributeName);
        }
        Step::Progress
    }

    fn step_in_attribute_name<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(at) = self.position_from(|b| b == b'=' || is_end_of_tag_section(b)) else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let flow = sink.on_attribute_name(
            Span::new(self.section_start, at),
            self.slice(self.section_start, at),
        );
        self.note(flow);
        self.attr_name_end = at;
        self.section_start = at;
        self.index = at;
        self.transition_to(TokenizerState::AfterAttributeName);
        Step::Progress
    }

    fn step_after_attribute_name<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let c = self.byte_at(self.index);
        match c {
            b'=' => {
                self.index += 1;
                self.transition_to(TokenizerState::BeforeAttributeValue);
            }
            b'/' | b'>' => {
                let flow = sink.on_attribute_end(None, self.attr_name_end);
                self.note(flow);
                self.section_start = self.index;
                self.transition_to(TokenizerState::BeforeAttributeName);
            }
            c if is_whitespace(c) => self.index += 1,
            _ => {
                let flow = sink.on_attribute_end(None, self.attr_name_end);
                self.note(flow);
                self.section_start = self.index;
                self.index += 1;
                self.transition_to(TokenizerState::InAttributeName);
            }
        }
        Step::Progress
    }

    fn step_before_attribute_value(&mut self) -> Step {
        let c = self.byte_at(self.index);
        match c {
            b'"' | b'\'' => {
                let quote = if c == b'"' {
                    QuoteKind::Double
                } else {
                    QuoteKind::Single
                };
                self.index += 1;
                self.section_start = self.index;
                self.transition_to(TokenizerState::InAttributeValueQuoted(quote));
            }
            c if is_whitespace(c) => self.index += 1,
            _ => {
                self.section_start = self.index;
                self.transition_to(TokenizerState::InAttributeValueUnquoted);
            }
        }
        Step::Progress
    }

    fn step_in_attribute_value_quoted<S: LexicalSink>(
        &mut self,
        sink: &mut S,
        quote: QuoteKind,
    ) -> Step {
        let q = quote.byte();
        let hit = if self.options.decode_entities {
            self.find_either(q, b'&')
        } else {
            self.find_byte(q)
        };
        let Some(at) = hit else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        if self.byte_at(at) == b'&' {
            self.begin_entity(sink, at);
            return Step::Progress;
        }
        self.emit_attribute_data(sink, self.section_start, at);
        let flow = sink.on_attribute_end(Some(quote), at + 1);
        self.note(flow);
        self.index = at + 1;
        self.section_start = self.index;
        self.transition_to(TokenizerState::BeforeAttributeName);
        Step::Progress
    }

    fn step_in_attribute_value_unquoted<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let decode = self.options.decode_entities;
        let Some(at) = self.position_from(|b| is_whitespace(b) || b == b'>' || (decode && b == b'&'))
        else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        if self.byte_at(at) == b'&' {
            self.begin_entity(sink, at);
            return Step::Progress;
        }
        self.emit_attribute_data(sink, self.section_start, at);
        let flow = sink.on_attribute_end(Some(QuoteKind::Unquoted), at);
        self.note(flow);
        self.index = at;
        self.section_start = at;
        self.transition_to(TokenizerState::BeforeAttributeName);
        Step::Progress
    }

    fn step_before_closing_tag_name(&mut self) -> Step {
        let c = self.byte_at(self.index);
        if is_whitespace(c) {
            self.index += 1;
        } else if c == b'>' {
            // `</>` is dropped entirely.
            self.index += 1;
            self.section_start = self.index;
            self.transition_to(TokenizerState::Text);
        } else if self.is_tag_start_char(c) {
            self.section_start = self.index;
            self.index += 1;
            self.transition_to(TokenizerState::InClosingTagName);
        } else {
            self.body_start = self.index;
            self.transition_to(TokenizerState::InSpecialComment);
        }
        Step::Progress
    }

    fn step_in_closing_tag_name(&mut self) -> Step {
        let Some(at) = self.position_from(is_end_of_tag_section) else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        self.close_name_end = at;
        self.index = at;
        self.transition_to(TokenizerState::AfterClosingTagName);
        Step::Progress
    }

    fn step_after_closing_tag_name<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(gt) = self.find_byte(b'>') else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let flow = sink.on_close_tag(
            Span::new(self.tag_start, gt + 1),
            self.slice(self.section_start, self.close_name_end),
        );
        self.note(flow);
        self.index = gt + 1;
        self.section_start = self.index;
        self.transition_to(TokenizerState::Text);
        Step::Progress
    }

    fn step_before_declaration(&mut self) -> Step {
        match self.byte_at(self.index) {
            b'[' => {
                self.index += 1;
                self.transition_to(TokenizerState::CdataSequence);
            }
            b'-' => {
                self.index += 1;
                self.transition_to(TokenizerState::BeforeComment);
            }
            _ => self.transition_to(TokenizerState::InDeclaration),
        }
        Step::Progress
    }

    fn step_cdata_sequence(&mut self) -> Step {
        const CDATA: &[u8] = b"CDATA[";
        match self.match_ascii_prefix(self.index, CDATA, false) {
            MatchResult::Matched => {
                self.index += CDATA.len();
                self.body_start = self.index;
                self.transition_to(TokenizerState::InCommentLike(CommentKind::Cdata));
            }
            MatchResult::NeedMoreInput => return Step::NeedMoreInput,
            MatchResult::NoMatch => self.transition_to(TokenizerState::InDeclaration),
        }
        Step::Progress
    }

    fn step_before_comment(&mut self) -> Step {
        if self.byte_at(self.index) == b'-' {
            self.index += 1;
            self.body_start = self.index;
            self.transition_to(TokenizerState::InCommentLike(CommentKind::Comment));
        } else {
            self.transition_to(TokenizerState::InDeclaration);
        }
        Step::Progress
    }

    fn step_in_comment_like<S: LexicalSink>(&mut self, sink: &mut S, kind: CommentKind) -> Step {
        // The closing dashes of a comment may overlap the opening ones, so
        // `<!-->` and `<!--->` are complete (empty) comments.
        let (close, earliest_gt) = match kind {
            CommentKind::Comment => (b'-', self.body_start),
            CommentKind::Cdata => (b']', self.body_start + 2),
        };
        loop {
            let Some(gt) = self.find_byte(b'>') else {
                self.index = self.end_offset();
                return Step::NeedMoreInput;
            };
            if gt >= earliest_gt
                && self.byte_at(gt - 1) == close
                && self.byte_at(gt - 2) == close
            {
                let body_end = (gt - 2).max(self.body_start);
                let span = Span::new(self.tag_start, gt + 1);
                let body = self.slice(self.body_start, body_end);
                let flow = match kind {
                    CommentKind::Comment => sink.on_comment(span, body),
                    CommentKind::Cdata => sink.on_cdata(span, body),
                };
                self.note(flow);
                self.index = gt + 1;
                self.section_start = self.index;
                self.transition_to(TokenizerState::Text);
                return Step::Progress;
            }
            self.index = gt + 1;
        }
    }

    fn step_in_declaration<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(gt) = self.find_byte(b'>') else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let flow = sink.on_declaration(
            Span::new(self.tag_start, gt + 1),
            self.slice(self.body_start, gt),
        );
        self.finish_markup(flow, gt)
    }

    fn step_in_processing_instruction<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(gt) = self.find_byte(b'>') else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let flow = sink.on_processing_instruction(
            Span::new(self.tag_start, gt + 1),
            self.slice(self.body_start, gt),
        );
        self.finish_markup(flow, gt)
    }

    fn step_in_special_comment<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(gt) = self.find_byte(b'>') else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        let flow = sink.on_comment(
            Span::new(self.tag_start, gt + 1),
            self.slice(self.body_start, gt),
        );
        self.finish_markup(flow, gt)
    }

    fn finish_markup(&mut self, flow: Flow, gt: usize) -> Step {
        self.note(flow);
        self.index = gt + 1;
        self.section_start = self.index;
        self.transition_to(TokenizerState::Text);
        Step::Progress
    }

    fn step_raw_text<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let Some(kind) = self.raw_text else {
            self.transition_to(TokenizerState::Text);
            return Step::Progress;
        };
        let hit = if self.options.decode_entities && kind.decodes_entities() {
            self.find_either(b'<', b'&')
        } else {
            self.find_byte(b'<')
        };
        let Some(at) = hit else {
            self.index = self.end_offset();
            return Step::NeedMoreInput;
        };
        if self.byte_at(at) == b'&' {
            self.begin_entity(sink, at);
            return Step::Progress;
        }

        let name = kind.name();
        let close = match self.match_ascii_prefix(at, b"</", false) {
            MatchResult::Matched => self.match_ascii_prefix(at + 2, name, true),
            other => other,
        };
        let terminated = match close {
            MatchResult::Matched => {
                let after = at + 2 + name.len();
                if after < self.end_offset() {
                    if is_end_of_tag_section(self.byte_at(after)) {
                        MatchResult::Matched
                    } else {
                        MatchResult::NoMatch
                    }
                } else if self.ended {
                    MatchResult::NoMatch
                } else {
                    MatchResult::NeedMoreInput
                }
            }
            other => other,
        };
        match terminated {
            MatchResult::Matched => {
                self.emit_text(sink, self.section_start, at);
                self.tag_start = at;
                self.section_start = at + 2;
                self.close_name_end = at + 2 + name.len();
                self.index = self.close_name_end;
                self.raw_text = None;
                self.transition_to(TokenizerState::AfterClosingTagName);
                Step::Progress
            }
            MatchResult::NeedMoreInput => {
                self.index = at;
                Step::NeedMoreInput
            }
            MatchResult::NoMatch => {
                self.index = at + 1;
                Step::Progress
            }
        }
    }

    fn begin_entity<S: LexicalSink>(&mut self, sink: &mut S, at: usize) {
        if self.state.is_attribute_value() {
            self.emit_attribute_data(sink, self.section_start, at);
        } else {
            self.emit_text(sink, self.section_start, at);
        }
        self.section_start = at;
        self.index = at;
        self.base_state = self.state;
        self.transition_to(TokenizerState::InEntity);
    }

    fn decode_mode(&self) -> DecodeMode {
        if self.options.xml_mode {
            DecodeMode::Strict
        } else if self.base_state.is_attribute_value() {
            DecodeMode::Attribute
        } else {
            DecodeMode::Legacy
        }
    }

    fn step_in_entity<S: LexicalSink>(&mut self, sink: &mut S) -> Step {
        let start = self.section_start;
        let outcome = entities::decode_reference(
            self.slice(start, self.end_offset()),
            self.decode_mode(),
            self.ended,
        );
        match outcome {
            DecodeOutcome::Matched { consumed, value } => {
                let end = start + consumed;
                let span = Span::new(start, end);
                let mut scratch = [0u8; 4];
                let decoded: &str = match value {
                    Replacement::Char(ch) => &*ch.encode_utf8(&mut scratch),
                    Replacement::Str(s) => s,
                };
                let flow = if self.base_state.is_attribute_value() {
                    sink.on_attribute_data(span, decoded)
                } else {
                    sink.on_text(span, decoded)
                };
                self.note(flow);
                self.section_start = end;
                self.index = end;
                self.transition_to(self.base_state);
                Step::Progress
            }
            DecodeOutcome::NotReference => {
                // The `&` stays in the section as literal data.
                self.index = start + 1;
                self.transition_to(self.base_state);
                Step::Progress
            }
            DecodeOutcome::NeedMoreInput => Step::NeedMoreInput,
        }
    }

    /// Settle whatever is still buffered once the stream has ended.
    ///
    /// Unterminated comments, declarations and end tags degrade to text. An
    /// open tag whose name was already reported is completed as if its `>`
    /// were the last byte of the stream, so consumers never see a start tag
    /// without its end.
    fn handle_trailing_data<S: LexicalSink>(&mut self, sink: &mut S) {
        let end = self.end_offset();
        match self.state {
            TokenizerState::Text
            | TokenizerState::InRawText
            | TokenizerState::InScriptData
            | TokenizerState::InEntity => self.emit_text(sink, self.section_start, end),
            TokenizerState::BeforeAttributeName | TokenizerState::InSelfClosingTag => {
                self.complete_open_tag(sink, end);
            }
            TokenizerState::InAttributeName => {
                let flow = sink.on_attribute_name(
                    Span::new(self.section_start, end),
                    self.slice(self.section_start, end),
                );
                self.note(flow);
                let flow = sink.on_attribute_end(None, end);
                self.note(flow);
                self.complete_open_tag(sink, end);
            }
            TokenizerState::AfterAttributeName => {
                let flow = sink.on_attribute_end(None, self.attr_name_end);
                self.note(flow);
                self.complete_open_tag(sink, end);
            }
            TokenizerState::BeforeAttributeValue => {
                let flow = sink.on_attribute_end(Some(QuoteKind::Unquoted), end);
                self.note(flow);
                self.complete_open_tag(sink, end);
            }
            TokenizerState::InAttributeValueQuoted(quote) => {
                self.emit_attribute_data(sink, self.section_start, end);
                let flow = sink.on_attribute_end(Some(quote), end);
                self.note(flow);
                self.complete_open_tag(sink, end);
            }
            TokenizerState::InAttributeValueUnquoted => {
                self.emit_attribute_data(sink, self.section_start, end);
                let flow = sink.on_attribute_end(Some(QuoteKind::Unquoted), end);
                self.note(flow);
                self.complete_open_tag(sink, end);
            }
            TokenizerState::BeforeTagName
            | TokenizerState::InTagName
            | TokenizerState::BeforeClosingTagName
            | TokenizerState::InClosingTagName
            | TokenizerState::AfterClosingTagName
            | TokenizerState::BeforeDeclaration
            | TokenizerState::CdataSequence
            | TokenizerState::BeforeComment
            | TokenizerState::InDeclaration
            | TokenizerState::InProcessingInstruction
            | TokenizerState::InCommentLike(_)
            | TokenizerState::InSpecialComment => {
                log::debug!(
                    target: "htmlsax.tokenizer",
                    "unterminated {:?} at end of input degrades to text",
                    self.state
                );
                self.emit_text(sink, self.tag_start.min(self.section_start), end);
            }
        }
        self.index = end;
        self.section_start = end;
        self.raw_text = None;
        self.transition_to(TokenizerState::Text);
    }

    fn complete_open_tag<S: LexicalSink>(&mut self, sink: &mut S, end: usize) {
        log::debug!(target: "htmlsax.tokenizer", "open tag at {} closed by end of input", self.tag_start);
        let flow = sink.on_open_tag_end(end.saturating_sub(1).max(self.tag_start));
        self.note(flow);
    }
}
