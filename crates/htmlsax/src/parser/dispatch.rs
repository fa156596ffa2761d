//! Lexical-to-semantic event translation.
//!
//! `Dispatch` is the [`LexicalSink`] the parser hands to its tokenizer for the
//! duration of one `write`/`end`/`resume` call. It borrows the parser's state
//! and handler, so everything a callback can observe lives in `ParserCore`.

use crate::error::{HandlerResult, ParserError};
use crate::options::ResolvedOptions;
use crate::span::Span;
use crate::tokenizer::{Flow, LexicalSink, QuoteKind};

use super::attributes::Attributes;
use super::elements;
use super::handler::{EventContext, Handler};
use super::stack::{OpenElement, OpenElementsStack};

struct PendingTag {
    name: String,
    start: usize,
    attributes: Attributes,
    /// Whether the element is already on the open-element stack.
    pushed: bool,
}

struct PendingAttribute {
    name: String,
    value: String,
    start: usize,
}

pub(crate) struct ParserCore {
    pub(crate) options: ResolvedOptions,
    pub(crate) stack: OpenElementsStack,
    /// Innermost last; `true` while inside SVG/MathML content.
    foreign_context: Vec<bool>,
    pub(crate) cx: EventContext,
    text: String,
    text_span: Option<Span>,
    tag: Option<PendingTag>,
    attribute: Option<PendingAttribute>,
    abandoned: bool,
}

impl ParserCore {
    pub(crate) fn new(options: ResolvedOptions) -> Self {
        Self {
            options,
            stack: OpenElementsStack::default(),
            foreign_context: vec![options.xml_mode],
            cx: EventContext::default(),
            text: String::new(),
            text_span: None,
            tag: None,
            attribute: None,
            abandoned: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = ParserCore::new(self.options);
    }

    /// Drop the leftovers of an abandoned scan. Returns whether the scan was
    /// abandoned.
    pub(crate) fn finish_scan(&mut self) -> bool {
        if !self.abandoned {
            return false;
        }
        self.abandoned = false;
        // The handler never saw `on_open_tag` for this element.
        if let Some(tag) = self.tag.take()
            && tag.pushed
        {
            self.pop_element();
        }
        self.attribute = None;
        self.text.clear();
        self.text_span = None;
        self.cx.take_pause_request();
        true
    }

    fn html_mode(&self) -> bool {
        !self.options.xml_mode
    }

    fn fold_tag(&self, raw: &str) -> String {
        if self.options.lower_case_tags {
            raw.to_lowercase()
        } else {
            raw.to_string()
        }
    }

    fn fold_attribute(&self, raw: &str) -> String {
        if self.options.lower_case_attribute_names {
            raw.to_lowercase()
        } else {
            raw.to_string()
        }
    }

    fn is_void(&self, name: &str) -> bool {
        self.html_mode() && elements::is_void(name)
    }

    fn in_foreign_content(&self) -> bool {
        self.foreign_context.last().copied().unwrap_or(false)
    }

    fn push_element(&mut self, name: &str, start: usize) {
        if self.html_mode() {
            if elements::is_foreign_context(name) {
                self.foreign_context.push(true);
            } else if elements::is_html_integration(name) {
                self.foreign_context.push(false);
            }
        }
        self.stack.push(OpenElement {
            name: name.to_string(),
            start,
        });
    }

    fn pop_element(&mut self) -> Option<OpenElement> {
        let element = self.stack.pop()?;
        if self.html_mode()
            && (elements::is_foreign_context(&element.name)
                || elements::is_html_integration(&element.name))
            && self.foreign_context.len() > 1
        {
            self.foreign_context.pop();
        }
        Some(element)
    }

    /// First word of a declaration or instruction body.
    fn instruction_name(&self, body: &str) -> String {
        let end = body
            .find(|c: char| c.is_whitespace() || c == '/')
            .unwrap_or(body.len());
        self.fold_tag(&body[..end])
    }
}

pub(crate) struct Dispatch<'a, H> {
    pub(crate) core: &'a mut ParserCore,
    pub(crate) handler: &'a mut H,
}

impl<H: Handler> Dispatch<'_, H> {
    /// Position the context and invoke one callback. A failing callback is
    /// reported and poisons the rest of the scan.
    fn emit(
        &mut self,
        callback: &'static str,
        start: usize,
        end: usize,
        f: impl FnOnce(&mut H, &mut EventContext) -> HandlerResult,
    ) {
        if self.core.abandoned {
            return;
        }
        self.core.cx.set_position(start, end);
        if let Err(source) = f(&mut *self.handler, &mut self.core.cx) {
            log::debug!(
                target: "htmlsax.parser",
                "callback `{callback}` failed at {start}..={end}; abandoning scan"
            );
            self.core.abandoned = true;
            self.handler.on_error(ParserError::Handler { callback, source });
        }
    }

    fn flow(&mut self) -> Flow {
        if self.core.abandoned {
            Flow::Abandon
        } else if self.core.cx.take_pause_request() {
            Flow::Pause
        } else {
            Flow::Continue
        }
    }

    fn flush_text(&mut self) {
        let Some(span) = self.core.text_span.take() else {
            return;
        };
        let text = std::mem::take(&mut self.core.text);
        self.emit("on_text", span.start, span.last(), |h, cx| {
            h.on_text(cx, &text)
        });
    }

    fn open_tag_start(&mut self, name: String, start: usize, end: usize) {
        if self.core.html_mode()
            && let Some(closes) = elements::open_implies_close(&name)
        {
            loop {
                let Some(current) = self.core.stack.current_name() else {
                    break;
                };
                if !closes.contains(&current) {
                    break;
                }
                let Some(closed) = self.core.pop_element() else {
                    break;
                };
                self.emit("on_close_tag", start, end, |h, cx| {
                    h.on_close_tag(cx, &closed.name, true)
                });
            }
        }
        let pushed = !self.core.is_void(&name);
        if pushed {
            self.core.push_element(&name, start);
        }
        self.emit("on_open_tag_name", start, end, |h, cx| {
            h.on_open_tag_name(cx, &name)
        });
        self.core.tag = Some(PendingTag {
            name,
            start,
            attributes: Attributes::new(),
            pushed,
        });
    }

    fn end_open_tag(&mut self, gt: usize, implied: bool) {
        let Some(tag) = self.core.tag.take() else {
            return;
        };
        self.emit("on_open_tag", tag.start, gt, |h, cx| {
            h.on_open_tag(cx, &tag.name, &tag.attributes, implied)
        });
        if self.core.is_void(&tag.name) {
            self.emit("on_close_tag", tag.start, gt, |h, cx| {
                h.on_close_tag(cx, &tag.name, true)
            });
        }
    }

    fn close_current_tag(&mut self, gt: usize, open_implied: bool) {
        let Some((name, start)) = self
            .core
            .tag
            .as_ref()
            .map(|tag| (tag.name.clone(), tag.start))
        else {
            return;
        };
        self.end_open_tag(gt, open_implied);
        if self.core.stack.current_name() == Some(name.as_str()) {
            self.core.pop_element();
            self.emit("on_close_tag", start, gt, |h, cx| {
                h.on_close_tag(cx, &name, !open_implied)
            });
        }
    }

    fn comment(&mut self, span: Span, text: &str) {
        self.emit("on_comment", span.start, span.last(), |h, cx| {
            h.on_comment(cx, text)
        });
        self.emit("on_comment_end", span.start, span.last(), |h, cx| {
            h.on_comment_end(cx)
        });
    }

    fn instruction(&mut self, span: Span, sigil: char, body: &str) {
        let name = format!("{sigil}{}", self.core.instruction_name(body));
        let data = format!("{sigil}{body}");
        self.emit("on_processing_instruction", span.start, span.last(), |h, cx| {
            h.on_processing_instruction(cx, &name, &data)
        });
    }
}

impl<H: Handler> LexicalSink for Dispatch<'_, H> {
    fn on_text(&mut self, span: Span, text: &str) -> Flow {
        if !self.core.abandoned {
            self.core.text.push_str(text);
            self.core.text_span = Some(match self.core.text_span {
                Some(run) => Span::new(run.start, span.end),
                None => span,
            });
        }
        self.flow()
    }

    fn on_open_tag_name(&mut self, tag_start: usize, span: Span, name: &str) -> Flow {
        self.flush_text();
        let name = self.core.fold_tag(name);
        self.open_tag_start(name, tag_start, span.end);
        self.flow()
    }

    fn on_attribute_name(&mut self, span: Span, name: &str) -> Flow {
        self.core.attribute = Some(PendingAttribute {
            name: self.core.fold_attribute(name),
            value: String::new(),
            start: span.start,
        });
        self.flow()
    }

    fn on_attribute_data(&mut self, _span: Span, data: &str) -> Flow {
        if let Some(attribute) = self.core.attribute.as_mut() {
            attribute.value.push_str(data);
        }
        self.flow()
    }

    fn on_attribute_end(&mut self, quote: Option<QuoteKind>, end: usize) -> Flow {
        let Some(attribute) = self.core.attribute.take() else {
            return self.flow();
        };
        let last = end.saturating_sub(1).max(attribute.start);
        self.emit("on_attribute", attribute.start, last, |h, cx| {
            h.on_attribute(cx, &attribute.name, &attribute.value, quote)
        });
        if let Some(tag) = self.core.tag.as_mut() {
            tag.attributes.insert(attribute.name, attribute.value);
        }
        self.flow()
    }

    fn on_open_tag_end(&mut self, gt: usize) -> Flow {
        self.end_open_tag(gt, false);
        self.flow()
    }

    fn on_self_closing_tag(&mut self, gt: usize) -> Flow {
        if self.core.options.recognize_self_closing || self.core.in_foreign_content() {
            self.close_current_tag(gt, false);
        } else {
            self.end_open_tag(gt, false);
        }
        self.flow()
    }

    fn on_close_tag(&mut self, span: Span, name: &str) -> Flow {
        self.flush_text();
        let name = self.core.fold_tag(name);
        let (start, last) = (span.start, span.last());

        if !self.core.is_void(&name) {
            if let Some(depth) = self.core.stack.rposition(&name) {
                while self.core.stack.len() > depth {
                    let Some(element) = self.core.pop_element() else {
                        break;
                    };
                    let implied = self.core.stack.len() > depth;
                    self.emit("on_close_tag", start, last, |h, cx| {
                        h.on_close_tag(cx, &element.name, implied)
                    });
                }
            } else if self.core.html_mode() && name == "p" {
                // `</p>` without an open `p` is an empty paragraph.
                self.open_tag_start(name, start, last);
                self.close_current_tag(last, true);
            } else {
                log::trace!(target: "htmlsax.parser", "ignoring unmatched </{name}> at {start}");
            }
        } else if self.core.html_mode() && name == "br" {
            // `</br>` is a `<br>`; the implied-close rules do not apply.
            self.emit("on_open_tag_name", start, last, |h, cx| {
                h.on_open_tag_name(cx, &name)
            });
            let attributes = Attributes::new();
            self.emit("on_open_tag", start, last, |h, cx| {
                h.on_open_tag(cx, &name, &attributes, true)
            });
            self.emit("on_close_tag", start, last, |h, cx| {
                h.on_close_tag(cx, &name, false)
            });
        }
        self.flow()
    }

    fn on_comment(&mut self, span: Span, body: &str) -> Flow {
        self.flush_text();
        self.comment(span, body);
        self.flow()
    }

    fn on_cdata(&mut self, span: Span, body: &str) -> Flow {
        self.flush_text();
        if self.core.options.recognize_cdata {
            let (start, last) = (span.start, span.last());
            self.emit("on_cdata_start", start, last, |h, cx| h.on_cdata_start(cx));
            self.emit("on_cdata", start, last, |h, cx| h.on_cdata(cx, body));
            self.emit("on_cdata_end", start, last, |h, cx| h.on_cdata_end(cx));
        } else {
            self.comment(span, &format!("[CDATA[{body}]]"));
        }
        self.flow()
    }

    fn on_declaration(&mut self, span: Span, body: &str) -> Flow {
        self.flush_text();
        self.instruction(span, '!', body);
        self.flow()
    }

    fn on_processing_instruction(&mut self, span: Span, body: &str) -> Flow {
        self.flush_text();
        self.instruction(span, '?', body);
        self.flow()
    }

    fn on_end(&mut self, end: usize) {
        // A new unit: an earlier failure in this call does not suppress it.
        self.core.abandoned = false;
        self.flush_text();
        while let Some(element) = self.core.pop_element() {
            self.emit("on_close_tag", end, end, |h, cx| {
                h.on_close_tag(cx, &element.name, true)
            });
        }
        self.emit("on_end", end, end, |h, cx| h.on_end(cx));
    }
}
