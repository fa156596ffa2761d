//! Streaming, event-driven HTML/XML parsing.
//!
//! Markup is fed in arbitrary chunks to a [`Parser`], which drives a
//! [`Tokenizer`] and reports semantic events (tags, attributes, text,
//! comments, CDATA, instructions) to a [`Handler`] together with the byte
//! range of the markup that produced each one.

pub mod entities;
pub mod error;
pub mod options;
pub mod parser;
pub mod span;
#[cfg(test)]
mod streaming_parity;
pub mod tokenizer;

pub use crate::error::{HandlerError, HandlerResult, ParserError};
pub use crate::options::{ParserOptions, ResolvedOptions, TokenizerOptions};
pub use crate::parser::{
    Attributes, Event, EventCollector, EventContext, Handler, Lifecycle, Parser, RecordedEvent,
};
pub use crate::span::Span;
pub use crate::tokenizer::{Flow, LexicalSink, QuoteKind, Tokenize, Tokenizer, TokenizerStats};

/// Parse a complete document in one call and hand the handler back.
pub fn parse_document<H: Handler>(handler: H, input: &str, options: ParserOptions) -> H {
    let mut parser = Parser::new(handler, options);
    parser.end_with(input);
    parser.into_handler()
}
