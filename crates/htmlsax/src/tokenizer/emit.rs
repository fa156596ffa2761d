//! Sink emission helpers.

use super::{Flow, LexicalSink, Tokenizer, TokenizerState};
use crate::span::Span;

impl Tokenizer {
    /// Record what the sink asked for. Pausing takes effect before the next
    /// unit; abandoning drops everything still buffered once the current step
    /// returns.
    pub(super) fn note(&mut self, flow: Flow) {
        self.stats.events_emitted = self.stats.events_emitted.saturating_add(1);
        match flow {
            Flow::Continue => {}
            Flow::Pause => {
                log::debug!(target: "htmlsax.tokenizer", "paused by sink @{}", self.index);
                self.running = false;
            }
            Flow::Abandon => {
                log::debug!(target: "htmlsax.tokenizer", "scan abandoned by sink @{}", self.index);
                self.abandon = true;
            }
        }
    }

    pub(super) fn emit_text<S: LexicalSink>(&mut self, sink: &mut S, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let flow = sink.on_text(Span::new(start, end), self.slice(start, end));
        self.note(flow);
    }

    pub(super) fn emit_attribute_data<S: LexicalSink>(
        &mut self,
        sink: &mut S,
        start: usize,
        end: usize,
    ) {
        if start >= end {
            return;
        }
        let flow = sink.on_attribute_data(Span::new(start, end), self.slice(start, end));
        self.note(flow);
    }

    /// Deliver whatever partial text or attribute data the current chunk
    /// completed, so the retained buffer only holds undecided bytes.
    pub(super) fn flush_partial<S: LexicalSink>(&mut self, sink: &mut S) {
        if !self.running || self.section_start >= self.index {
            return;
        }
        match self.state {
            TokenizerState::Text | TokenizerState::InRawText | TokenizerState::InScriptData => {
                self.emit_text(sink, self.section_start, self.index);
                self.section_start = self.index;
            }
            state if state.is_attribute_value() => {
                self.emit_attribute_data(sink, self.section_start, self.index);
                self.section_start = self.index;
            }
            _ => {}
        }
    }

    /// Forget every buffered byte after a sink abandoned the scan.
    pub(super) fn discard_buffered(&mut self) {
        let end = self.end_offset();
        self.index = end;
        self.section_start = end;
        self.tag_start = end;
        self.raw_text = None;
        self.abandon = false;
        self.transition_to(TokenizerState::Text);
        self.compact();
    }
}
