//! Handler trait and the per-event context handed to every callback.

use crate::error::{HandlerResult, ParserError};
use crate::tokenizer::QuoteKind;

use super::Attributes;

/// Position and control surface for the event being dispatched.
///
/// `start_index`/`end_index` are byte offsets of the first and last byte
/// (inclusive) of the source that produced the event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventContext {
    start_index: usize,
    end_index: usize,
    pause_requested: bool,
}

impl EventContext {
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    /// Stop scanning before the next lexical unit. Later writes are queued
    /// until [`Parser::resume`](super::Parser::resume).
    pub fn pause(&mut self) {
        self.pause_requested = true;
    }

    pub fn is_pause_requested(&self) -> bool {
        self.pause_requested
    }

    pub(crate) fn set_position(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end, "event start {start} after end {end}");
        self.start_index = start;
        self.end_index = end.max(start);
    }

    pub(crate) fn take_pause_request(&mut self) -> bool {
        std::mem::take(&mut self.pause_requested)
    }
}

/// Receiver of semantic events. Every callback is optional.
///
/// Returning `Err` from a callback reports [`ParserError::Handler`] through
/// [`Handler::on_error`] and abandons the rest of the current scan.
#[allow(unused_variables)]
pub trait Handler {
    fn on_parser_init(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    fn on_reset(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    fn on_open_tag_name(&mut self, cx: &mut EventContext, name: &str) -> HandlerResult {
        Ok(())
    }

    fn on_attribute(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        value: &str,
        quote: Option<QuoteKind>,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_open_tag(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        attributes: &Attributes,
        implied: bool,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_text(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        Ok(())
    }

    fn on_close_tag(&mut self, cx: &mut EventContext, name: &str, implied: bool) -> HandlerResult {
        Ok(())
    }

    fn on_comment(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        Ok(())
    }

    fn on_comment_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    fn on_cdata_start(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    fn on_cdata(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        Ok(())
    }

    fn on_cdata_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    fn on_processing_instruction(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        data: &str,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        Ok(())
    }

    /// Lifecycle misuse and callback failures land here. The default drops
    /// them.
    fn on_error(&mut self, error: ParserError) {}
}
