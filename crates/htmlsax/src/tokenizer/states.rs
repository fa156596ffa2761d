//! Tokenizer state machine definitions.

use super::QuoteKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenizerState {
    Text,
    BeforeTagName,
    InTagName,
    InSelfClosingTag,
    BeforeClosingTagName,
    InClosingTagName,
    AfterClosingTagName,
    BeforeAttributeName,
    InAttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    InAttributeValueQuoted(QuoteKind),
    InAttributeValueUnquoted,
    BeforeDeclaration,
    CdataSequence,
    BeforeComment,
    InDeclaration,
    InProcessingInstruction,
    InCommentLike(CommentKind),
    /// `</` followed by a byte that cannot start a tag name.
    InSpecialComment,
    InRawText,
    InScriptData,
    InEntity,
}

impl TokenizerState {
    pub(crate) fn is_attribute_value(self) -> bool {
        matches!(
            self,
            TokenizerState::InAttributeValueQuoted(_) | TokenizerState::InAttributeValueUnquoted
        )
    }

    /// States whose retained bytes start at the section start rather than at
    /// the `<` of the construct.
    pub(crate) fn retains_from_section(self) -> bool {
        matches!(
            self,
            TokenizerState::Text
                | TokenizerState::InRawText
                | TokenizerState::InScriptData
                | TokenizerState::InEntity
                | TokenizerState::BeforeAttributeName
                | TokenizerState::InSelfClosingTag
                | TokenizerState::InAttributeName
                | TokenizerState::AfterAttributeName
                | TokenizerState::BeforeAttributeValue
                | TokenizerState::InAttributeValueQuoted(_)
                | TokenizerState::InAttributeValueUnquoted
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommentKind {
    Comment,
    Cdata,
}

/// Elements whose body is not tokenized as markup (HTML mode only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RawTextKind {
    Script,
    Style,
    Xmp,
    Iframe,
    Noembed,
    Noframes,
    Title,
    Textarea,
}

impl RawTextKind {
    const ALL: [RawTextKind; 8] = [
        RawTextKind::Script,
        RawTextKind::Style,
        RawTextKind::Xmp,
        RawTextKind::Iframe,
        RawTextKind::Noembed,
        RawTextKind::Noframes,
        RawTextKind::Title,
        RawTextKind::Textarea,
    ];

    pub(crate) fn name(self) -> &'static [u8] {
        match self {
            RawTextKind::Script => b"script",
            RawTextKind::Style => b"style",
            RawTextKind::Xmp => b"xmp",
            RawTextKind::Iframe => b"iframe",
            RawTextKind::Noembed => b"noembed",
            RawTextKind::Noframes => b"noframes",
            RawTextKind::Title => b"title",
            RawTextKind::Textarea => b"textarea",
        }
    }

    /// Case-insensitive lookup by tag name.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| name.as_bytes().eq_ignore_ascii_case(kind.name()))
    }

    /// `title` and `textarea` are escapable raw text: references decode.
    pub(crate) fn decodes_entities(self) -> bool {
        matches!(self, RawTextKind::Title | RawTextKind::Textarea)
    }

    pub(crate) fn body_state(self) -> TokenizerState {
        match self {
            RawTextKind::Script => TokenizerState::InScriptData,
            _ => TokenizerState::InRawText,
        }
    }
}
