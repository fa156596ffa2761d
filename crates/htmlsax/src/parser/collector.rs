//! A handler that records every event with its position.

use std::fmt;

use crate::error::{HandlerResult, ParserError};
use crate::tokenizer::QuoteKind;

use super::{Attributes, EventContext, Handler};

/// One semantic event, owned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    ParserInit,
    Reset,
    OpenTagName(String),
    Attribute {
        name: String,
        value: String,
        quote: Option<QuoteKind>,
    },
    OpenTag {
        name: String,
        attributes: Vec<(String, String)>,
        implied: bool,
    },
    Text(String),
    CloseTag {
        name: String,
        implied: bool,
    },
    Comment(String),
    CommentEnd,
    CdataStart,
    Cdata(String),
    CdataEnd,
    ProcessingInstruction {
        name: String,
        data: String,
    },
    End,
    Error(String),
}

/// An event plus the inclusive byte range it was reported with. Errors carry
/// no position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub event: Event,
    pub position: Option<(usize, usize)>,
}

impl fmt::Display for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event {
            Event::ParserInit => f.write_str("init")?,
            Event::Reset => f.write_str("reset")?,
            Event::OpenTagName(name) => write!(f, "open_tag_name {name:?}")?,
            Event::Attribute { name, value, quote } => {
                write!(f, "attribute {name:?} {value:?}")?;
                match quote {
                    Some(QuoteKind::Double) => f.write_str(" double")?,
                    Some(QuoteKind::Single) => f.write_str(" single")?,
                    Some(QuoteKind::Unquoted) => f.write_str(" unquoted")?,
                    None => f.write_str(" bare")?,
                }
            }
            Event::OpenTag {
                name,
                attributes,
                implied,
            } => {
                write!(f, "open_tag {name:?} {{")?;
                for (i, (key, value)) in attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{key}={value:?}")?;
                }
                f.write_str("}")?;
                if *implied {
                    f.write_str(" implied")?;
                }
            }
            Event::Text(text) => write!(f, "text {text:?}")?,
            Event::CloseTag { name, implied } => {
                write!(f, "close_tag {name:?}")?;
                if *implied {
                    f.write_str(" implied")?;
                }
            }
            Event::Comment(text) => write!(f, "comment {text:?}")?,
            Event::CommentEnd => f.write_str("comment_end")?,
            Event::CdataStart => f.write_str("cdata_start")?,
            Event::Cdata(text) => write!(f, "cdata {text:?}")?,
            Event::CdataEnd => f.write_str("cdata_end")?,
            Event::ProcessingInstruction { name, data } => {
                write!(f, "pi {name:?} {data:?}")?
            }
            Event::End => f.write_str("end")?,
            Event::Error(message) => write!(f, "error {message:?}")?,
        }
        if let Some((start, end)) = self.position {
            write!(f, " @{start}..={end}")?;
        }
        Ok(())
    }
}

/// Records events in dispatch order.
///
/// `on_parser_init`/`on_reset` are only recorded when lifecycle recording is
/// enabled, so most event logs start at the first markup event.
#[derive(Clone, Debug, Default)]
pub struct EventCollector {
    events: Vec<RecordedEvent>,
    record_lifecycle: bool,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifecycle() -> Self {
        Self {
            record_lifecycle: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// One formatted line per event, positions included.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Concatenation of all text payloads.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|recorded| match &recorded.event {
                Event::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, cx: &EventContext, event: Event) -> HandlerResult {
        self.events.push(RecordedEvent {
            event,
            position: Some((cx.start_index(), cx.end_index())),
        });
        Ok(())
    }
}

impl Handler for EventCollector {
    fn on_parser_init(&mut self, cx: &mut EventContext) -> HandlerResult {
        if self.record_lifecycle {
            self.record(cx, Event::ParserInit)?;
        }
        Ok(())
    }

    fn on_reset(&mut self, cx: &mut EventContext) -> HandlerResult {
        if self.record_lifecycle {
            self.record(cx, Event::Reset)?;
        }
        Ok(())
    }

    fn on_open_tag_name(&mut self, cx: &mut EventContext, name: &str) -> HandlerResult {
        self.record(cx, Event::OpenTagName(name.to_string()))
    }

    fn on_attribute(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        value: &str,
        quote: Option<QuoteKind>,
    ) -> HandlerResult {
        self.record(
            cx,
            Event::Attribute {
                name: name.to_string(),
                value: value.to_string(),
                quote,
            },
        )
    }

    fn on_open_tag(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        attributes: &Attributes,
        implied: bool,
    ) -> HandlerResult {
        let attributes = attributes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.record(
            cx,
            Event::OpenTag {
                name: name.to_string(),
                attributes,
                implied,
            },
        )
    }

    fn on_text(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        self.record(cx, Event::Text(text.to_string()))
    }

    fn on_close_tag(&mut self, cx: &mut EventContext, name: &str, implied: bool) -> HandlerResult {
        self.record(
            cx,
            Event::CloseTag {
                name: name.to_string(),
                implied,
            },
        )
    }

    fn on_comment(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        self.record(cx, Event::Comment(text.to_string()))
    }

    fn on_comment_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        self.record(cx, Event::CommentEnd)
    }

    fn on_cdata_start(&mut self, cx: &mut EventContext) -> HandlerResult {
        self.record(cx, Event::CdataStart)
    }

    fn on_cdata(&mut self, cx: &mut EventContext, text: &str) -> HandlerResult {
        self.record(cx, Event::Cdata(text.to_string()))
    }

    fn on_cdata_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        self.record(cx, Event::CdataEnd)
    }

    fn on_processing_instruction(
        &mut self,
        cx: &mut EventContext,
        name: &str,
        data: &str,
    ) -> HandlerResult {
        self.record(
            cx,
            Event::ProcessingInstruction {
                name: name.to_string(),
                data: data.to_string(),
            },
        )
    }

    fn on_end(&mut self, cx: &mut EventContext) -> HandlerResult {
        self.record(cx, Event::End)
    }

    fn on_error(&mut self, error: ParserError) {
        self.events.push(RecordedEvent {
            event: Event::Error(error.to_string()),
            position: None,
        });
    }
}
