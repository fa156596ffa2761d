//! Parser configuration and mode-derived defaults.

/// User-facing parser options.
///
/// Every flag except `xml_mode` is tri-state: `None` means "derive from
/// `xml_mode`", `Some(_)` always wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub xml_mode: bool,
    pub decode_entities: Option<bool>,
    pub lower_case_tags: Option<bool>,
    pub lower_case_attribute_names: Option<bool>,
    pub recognize_cdata: Option<bool>,
    pub recognize_self_closing: Option<bool>,
}

impl ParserOptions {
    pub fn html() -> Self {
        Self::default()
    }

    pub fn xml() -> Self {
        Self {
            xml_mode: true,
            ..Self::default()
        }
    }

    pub fn xml_mode(mut self, on: bool) -> Self {
        self.xml_mode = on;
        self
    }

    pub fn decode_entities(mut self, on: bool) -> Self {
        self.decode_entities = Some(on);
        self
    }

    pub fn lower_case_tags(mut self, on: bool) -> Self {
        self.lower_case_tags = Some(on);
        self
    }

    pub fn lower_case_attribute_names(mut self, on: bool) -> Self {
        self.lower_case_attribute_names = Some(on);
        self
    }

    pub fn recognize_cdata(mut self, on: bool) -> Self {
        self.recognize_cdata = Some(on);
        self
    }

    pub fn recognize_self_closing(mut self, on: bool) -> Self {
        self.recognize_self_closing = Some(on);
        self
    }

    /// Apply mode-derived defaults to every unset flag.
    pub fn resolve(&self) -> ResolvedOptions {
        let xml = self.xml_mode;
        ResolvedOptions {
            xml_mode: xml,
            decode_entities: self.decode_entities.unwrap_or(true),
            lower_case_tags: self.lower_case_tags.unwrap_or(!xml),
            lower_case_attribute_names: self.lower_case_attribute_names.unwrap_or(!xml),
            recognize_cdata: self.recognize_cdata.unwrap_or(xml),
            recognize_self_closing: self.recognize_self_closing.unwrap_or(xml),
        }
    }
}

/// Fully resolved configuration; immutable for the lifetime of a parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub xml_mode: bool,
    pub decode_entities: bool,
    pub lower_case_tags: bool,
    pub lower_case_attribute_names: bool,
    pub recognize_cdata: bool,
    pub recognize_self_closing: bool,
}

impl ResolvedOptions {
    pub fn tokenizer(&self) -> TokenizerOptions {
        TokenizerOptions {
            xml_mode: self.xml_mode,
            decode_entities: self.decode_entities,
        }
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        ParserOptions::default().resolve()
    }
}

/// The subset of configuration a tokenizer is constructed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub xml_mode: bool,
    pub decode_entities: bool,
}
