//! Streaming parser: lifecycle, pause/resume queue and semantic dispatch.
//!
//! Invariants:
//! - Events are delivered synchronously inside the `write`/`end`/`resume`
//!   call that scanned the markup producing them.
//! - Chunk-equivalence: for any split of the same input, the handler sees the
//!   same event sequence with the same positions. Text is coalesced into one
//!   `on_text` per run to make this hold.
//! - `start_index <= end_index` for every event.
//! - Errors never cross the public API; they are reported to
//!   [`Handler::on_error`].

use std::collections::VecDeque;

use crate::error::{HandlerResult, ParserError};
use crate::options::{ParserOptions, ResolvedOptions};
use crate::tokenizer::{Tokenize, Tokenizer};
use tools::Utf8Decoder;
use dispatch::{Dispatch, ParserCore};

mod attributes;
mod collector;
mod dispatch;
mod elements;
mod handler;
mod stack;


pub use attributes::Attributes;
pub use collector::{Event, EventCollector, RecordedEvent};
pub use handler::{EventContext, Handler};

/// Observable lifecycle of a parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Writing,
    Paused,
    /// `end` was called. Writes are rejected; a paused parser still finishes
    /// the queued input on `resume`.
    Done,
}

pub struct Parser<H: Handler, T: Tokenize = Tokenizer> {
    handler: H,
    tokenizer: T,
    core: ParserCore,
    started: bool,
    end_requested: bool,
    /// Chunks written while paused, in arrival order.
    pending: VecDeque<String>,
    /// Incomplete UTF-8 suffix carried between `write_bytes` calls.
    utf8: Utf8Decoder,
}

impl<H: Handler> Parser<H> {
    pub fn new(handler: H, options: ParserOptions) -> Self {
        Self::with_tokenizer(handler, options)
    }
}

impl<H: Handler, T: Tokenize> Parser<H, T> {
    /// Build a parser around an alternate tokenizer implementation.
    pub fn with_tokenizer(handler: H, options: ParserOptions) -> Self {
        let resolved = options.resolve();
        let mut parser = Parser {
            handler,
            tokenizer: T::new(resolved.tokenizer()),
            core: ParserCore::new(resolved),
            started: false,
            end_requested: false,
            pending: VecDeque::new(),
            utf8: Utf8Decoder::new(),
        };
        parser.notify("on_parser_init", |h, cx| h.on_parser_init(cx));
        parser
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.core.options
    }

    /// Offset of the first byte of the current (or last dispatched) event.
    pub fn start_index(&self) -> usize {
        self.core.cx.start_index()
    }

    /// Offset of the last byte of the current (or last dispatched) event.
    pub fn end_index(&self) -> usize {
        self.core.cx.end_index()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.end_requested {
            Lifecycle::Done
        } else if !self.tokenizer.is_running() {
            Lifecycle::Paused
        } else if self.started {
            Lifecycle::Writing
        } else {
            Lifecycle::Idle
        }
    }

    pub fn is_paused(&self) -> bool {
        !self.tokenizer.is_running()
    }

    pub fn is_done(&self) -> bool {
        self.end_requested
    }

    /// Names and start offsets of the currently open elements, outermost first.
    pub fn open_elements(&self) -> impl Iterator<Item = (&str, usize)> {
        self.core
            .stack
            .iter()
            .map(|element| (element.name.as_str(), element.start))
    }

    /// Deepest nesting reached since construction or the last reset.
    pub fn max_depth(&self) -> usize {
        self.core.stack.max_depth()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Feed the next chunk of text.
    pub fn write(&mut self, chunk: &str) {
        if self.end_requested {
            log::debug!(target: "htmlsax.parser", "write after done");
            self.handler.on_error(ParserError::WriteAfterDone);
            return;
        }
        self.write_chunk(chunk);
    }

    /// Feed raw UTF-8 bytes; sequences split across calls are carried over.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.end_requested {
            log::debug!(target: "htmlsax.parser", "write_bytes after done");
            self.handler.on_error(ParserError::WriteAfterDone);
            return;
        }
        let mut text = String::new();
        self.utf8.push(bytes, &mut text);
        if !text.is_empty() {
            self.write_chunk(&text);
        }
    }

    /// Signal the end of input. Every element still open is closed
    /// (innermost first) and `on_end` fires; while paused this happens on
    /// `resume`.
    pub fn end(&mut self) {
        if self.end_requested {
            log::debug!(target: "htmlsax.parser", "end after done");
            self.handler.on_error(ParserError::EndAfterDone);
            return;
        }
        if self.utf8.has_pending() {
            let mut text = String::new();
            self.utf8.finish(&mut text);
            self.write_chunk(&text);
        }
        self.started = true;
        self.end_requested = true;
        if self.tokenizer.is_running() {
            self.scan(|tokenizer, sink| tokenizer.end(sink));
        }
    }

    /// `write(chunk)` followed by `end()`.
    pub fn end_with(&mut self, chunk: &str) {
        if self.end_requested {
            log::debug!(target: "htmlsax.parser", "end after done");
            self.handler.on_error(ParserError::EndAfterDone);
            return;
        }
        self.write_chunk(chunk);
        self.end();
    }

    /// Reset, then parse `data` as a complete document.
    pub fn parse_complete(&mut self, data: &str) {
        self.reset();
        self.end_with(data);
    }

    /// Stop scanning before the next lexical unit. Safe to call from inside
    /// a callback through [`EventContext::pause`].
    pub fn pause(&mut self) {
        log::debug!(target: "htmlsax.parser", "pause");
        self.tokenizer.pause();
    }

    /// Continue scanning buffered input, then replay queued writes in order.
    /// A pending `end` is honored once the queue is drained.
    pub fn resume(&mut self) {
        if self.tokenizer.is_running() {
            return;
        }
        log::debug!(
            target: "htmlsax.parser",
            "resume with {} queued chunk(s)",
            self.pending.len()
        );
        self.scan(|tokenizer, sink| tokenizer.resume(sink));
        while self.tokenizer.is_running() {
            let Some(chunk) = self.pending.pop_front() else {
                break;
            };
            self.scan(|tokenizer, sink| tokenizer.write(&chunk, sink));
        }
        if self.end_requested && self.tokenizer.is_running() && !self.tokenizer.is_finished() {
            self.scan(|tokenizer, sink| tokenizer.end(sink));
        }
    }

    /// Return to a freshly constructed state (same handler and options).
    /// `on_reset` fires first, then `on_parser_init`. A pause requested from
    /// either callback holds for the fresh state.
    pub fn reset(&mut self) {
        let paused = self.notify("on_reset", |h, cx| h.on_reset(cx));
        self.tokenizer.reset();
        self.core.reset();
        self.pending.clear();
        self.utf8.clear();
        self.started = false;
        self.end_requested = false;
        if paused {
            self.tokenizer.pause();
        }
        self.notify("on_parser_init", |h, cx| h.on_parser_init(cx));
    }

    fn write_chunk(&mut self, chunk: &str) {
        self.started = true;
        if !self.tokenizer.is_running() {
            log::trace!(target: "htmlsax.parser", "queueing {} bytes while paused", chunk.len());
            self.pending.push_back(chunk.to_owned());
            return;
        }
        self.scan(|tokenizer, sink| tokenizer.write(chunk, sink));
    }

    fn scan(&mut self, f: impl FnOnce(&mut T, &mut Dispatch<'_, H>)) {
        let mut sink = Dispatch {
            core: &mut self.core,
            handler: &mut self.handler,
        };
        f(&mut self.tokenizer, &mut sink);
        let abandoned = self.core.finish_scan();
        // A pause requested from the last callback of the scan (or `on_end`)
        // still applies to the next call.
        if !abandoned && self.core.cx.take_pause_request() {
            self.tokenizer.pause();
        }
    }

    /// Dispatch a callback the parser itself originates.
    fn notify(
        &mut self,
        callback: &'static str,
        f: impl FnOnce(&mut H, &mut EventContext) -> HandlerResult,
    ) -> bool {
        if let Err(source) = f(&mut self.handler, &mut self.core.cx) {
            self.handler.on_error(ParserError::Handler { callback, source });
        }
        let paused = self.core.cx.take_pause_request();
        if paused {
            self.tokenizer.pause();
        }
        paused
    }
}
