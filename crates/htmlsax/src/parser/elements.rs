//! HTML element classes used for structural inference.
//!
//! Lookups are exact string comparisons against the (possibly case-folded)
//! tag name; with `lower_case_tags` disabled, `BR` is not `br`.

const FORM_TAGS: &[&str] = &[
    "input", "option", "optgroup", "select", "button", "datalist", "textarea",
];
const P_TAG: &[&str] = &["p"];
const TABLE_SECTION_TAGS: &[&str] = &["thead", "tbody"];
const DDT_TAGS: &[&str] = &["dd", "dt"];
const RTP_TAGS: &[&str] = &["rt", "rp"];

/// Elements that an opening tag closes when one of them is the current node.
pub(crate) fn open_implies_close(name: &str) -> Option<&'static [&'static str]> {
    let closes: &'static [&'static str] = match name {
        "tr" => &["tr", "th", "td"],
        "th" => &["th"],
        "td" => &["thead", "th", "td"],
        "body" => &["head", "link", "script"],
        "li" => &["li"],
        "option" => &["option"],
        "optgroup" => &["optgroup", "option"],
        "dd" | "dt" => DDT_TAGS,
        "rt" | "rp" => RTP_TAGS,
        "tbody" | "tfoot" => TABLE_SECTION_TAGS,
        "select" | "input" | "output" | "button" | "datalist" | "textarea" => FORM_TAGS,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "address" | "article" | "aside"
        | "blockquote" | "details" | "div" | "dl" | "fieldset" | "figcaption" | "figure"
        | "footer" | "form" | "header" | "hr" | "main" | "nav" | "ol" | "pre" | "section"
        | "table" | "ul" => P_TAG,
        _ => return None,
    };
    Some(closes)
}

pub(crate) fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "basefont"
            | "br"
            | "col"
            | "command"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "isindex"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements that switch into foreign (SVG/MathML) content.
pub(crate) fn is_foreign_context(name: &str) -> bool {
    matches!(name, "math" | "svg")
}

/// Foreign-content elements whose children are HTML again.
pub(crate) fn is_html_integration(name: &str) -> bool {
    matches!(
        name,
        "mi" | "mo"
            | "mn"
            | "ms"
            | "mtext"
            | "annotation-xml"
            | "foreignobject"
            | "desc"
            | "title"
    )
}
