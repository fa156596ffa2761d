//! Named character reference data.
//!
//! HTML 4 entity set plus the HTML 5 ASCII-punctuation names and a handful of
//! frequently used additions. Sorted by byte order so lookups can binary
//! search and probe for prefixes.

/// `(name without ';', replacement)` pairs, sorted by `name` bytes.
pub(super) static NAMED: &[(&str, &str)] = &[
    ("AElig", "\u{C6}"),
    ("AMP", "&"),
    ("Aacute", "\u{C1}"),
    ("Acirc", "\u{C2}"),
    ("Agrave", "\u{C0}"),
    ("Alpha", "\u{391}"),
    ("Aring", "\u{C5}"),
    ("Atilde", "\u{C3}"),
    ("Auml", "\u{C4}"),
    ("Beta", "\u{392}"),
    ("COPY", "\u{A9}"),
    ("Ccedil", "\u{C7}"),
    ("Chi", "\u{3A7}"),
    ("Dagger", "\u{2021}"),
    ("Delta", "\u{394}"),
    ("ETH", "\u{D0}"),
    ("Eacute", "\u{C9}"),
    ("Ecirc", "\u{CA}"),
    ("Egrave", "\u{C8}"),
    ("Epsilon", "\u{395}"),
    ("Eta", "\u{397}"),
    ("Euml", "\u{CB}"),
    ("GT", ">"),
    ("Gamma", "\u{393}"),
    ("Hat", "^"),
    ("Iacute", "\u{CD}"),
    ("Icirc", "\u{CE}"),
    ("Igrave", "\u{CC}"),
    ("Iota", "\u{399}"),
    ("Iuml", "\u{CF}"),
    ("Kappa", "\u{39A}"),
    ("LT", "<"),
    ("Lambda", "\u{39B}"),
    ("Mu", "\u{39C}"),
    ("NewLine", "\u{A}"),
    ("NoBreak", "\u{2060}"),
    ("Ntilde", "\u{D1}"),
    ("Nu", "\u{39D}"),
    ("OElig", "\u{152}"),
    ("Oacute", "\u{D3}"),
    ("Ocirc", "\u{D4}"),
    ("Ograve", "\u{D2}"),
    ("Omega", "\u{3A9}"),
    ("Omicron", "\u{39F}"),
    ("Oslash", "\u{D8}"),
    ("Otilde", "\u{D5}"),
    ("Ouml", "\u{D6}"),
    ("Phi", "\u{3A6}"),
    ("Pi", "\u{3A0}"),
    ("Prime", "\u{2033}"),
    ("Psi", "\u{3A8}"),
    ("QUOT", "\""),
    ("REG", "\u{AE}"),
    ("Rho", "\u{3A1}"),
    ("Scaron", "\u{160}"),
    ("Sigma", "\u{3A3}"),
    ("THORN", "\u{DE}"),
    ("Tab", "\u{9}"),
    ("Tau", "\u{3A4}"),
    ("Theta", "\u{398}"),
    ("ThinSpace", "\u{2009}"),
    ("Uacute", "\u{DA}"),
    ("Ucirc", "\u{DB}"),
    ("Ugrave", "\u{D9}"),
    ("Upsilon", "\u{3A5}"),
    ("Uuml", "\u{DC}"),
    ("Xi", "\u{39E}"),
    ("Yacute", "\u{DD}"),
    ("Yuml", "\u{178}"),
    ("ZeroWidthSpace", "\u{200B}"),
    ("Zeta", "\u{396}"),
    ("aacute", "\u{E1}"),
    ("acirc", "\u{E2}"),
    ("acute", "\u{B4}"),
    ("aelig", "\u{E6}"),
    ("agrave", "\u{E0}"),
    ("alefsym", "\u{2135}"),
    ("alpha", "\u{3B1}"),
    ("amp", "&"),
    ("and", "\u{2227}"),
    ("ang", "\u{2220}"),
    ("apos", "'"),
    ("aring", "\u{E5}"),
    ("ast", "*"),
    ("asymp", "\u{2248}"),
    ("atilde", "\u{E3}"),
    ("auml", "\u{E4}"),
    ("bdquo", "\u{201E}"),
    ("beta", "\u{3B2}"),
    ("brvbar", "\u{A6}"),
    ("bsol", "\\"),
    ("bull", "\u{2022}"),
    ("bullet", "\u{2022}"),
    ("cap", "\u{2229}"),
    ("ccedil", "\u{E7}"),
    ("cedil", "\u{B8}"),
    ("cent", "\u{A2}"),
    ("check", "\u{2713}"),
    ("chi", "\u{3C7}"),
    ("circ", "\u{2C6}"),
    ("clubs", "\u{2663}"),
    ("colon", ":"),
    ("comma", ","),
    ("commat", "@"),
    ("cong", "\u{2245}"),
    ("copy", "\u{A9}"),
    ("crarr", "\u{21B5}"),
    ("cross", "\u{2717}"),
    ("cup", "\u{222A}"),
    ("curren", "\u{A4}"),
    ("dArr", "\u{21D3}"),
    ("dagger", "\u{2020}"),
    ("darr", "\u{2193}"),
    ("dash", "\u{2010}"),
    ("deg", "\u{B0}"),
    ("delta", "\u{3B4}"),
    ("diams", "\u{2666}"),
    ("divide", "\u{F7}"),
    ("dollar", "$"),
    ("eacute", "\u{E9}"),
    ("ecirc", "\u{EA}"),
    ("egrave", "\u{E8}"),
    ("empty", "\u{2205}"),
    ("emsp", "\u{2003}"),
    ("ensp", "\u{2002}"),
    ("epsilon", "\u{3B5}"),
    ("equals", "="),
    ("equiv", "\u{2261}"),
    ("eta", "\u{3B7}"),
    ("eth", "\u{F0}"),
    ("euml", "\u{EB}"),
    ("euro", "\u{20AC}"),
    ("excl", "!"),
    ("exist", "\u{2203}"),
    ("female", "\u{2640}"),
    ("fjlig", "fj"),
    ("flat", "\u{266D}"),
    ("fnof", "\u{192}"),
    ("forall", "\u{2200}"),
    ("frac12", "\u{BD}"),
    ("frac14", "\u{BC}"),
    ("frac34", "\u{BE}"),
    ("frasl", "\u{2044}"),
    ("gamma", "\u{3B3}"),
    ("ge", "\u{2265}"),
    ("grave", "`"),
    ("gt", ">"),
    ("hArr", "\u{21D4}"),
    ("half", "\u{BD}"),
    ("harr", "\u{2194}"),
    ("hearts", "\u{2665}"),
    ("hellip", "\u{2026}"),
    ("horbar", "\u{2015}"),
    ("hyphen", "\u{2010}"),
    ("iacute", "\u{ED}"),
    ("icirc", "\u{EE}"),
    ("iexcl", "\u{A1}"),
    ("igrave", "\u{EC}"),
    ("image", "\u{2111}"),
    ("infin", "\u{221E}"),
    ("int", "\u{222B}"),
    ("iota", "\u{3B9}"),
    ("iquest", "\u{BF}"),
    ("isin", "\u{2208}"),
    ("iuml", "\u{EF}"),
    ("kappa", "\u{3BA}"),
    ("lArr", "\u{21D0}"),
    ("lambda", "\u{3BB}"),
    ("lang", "\u{2329}"),
    ("laquo", "\u{AB}"),
    ("larr", "\u{2190}"),
    ("lbrace", "{"),
    ("lbrack", "["),
    ("lceil", "\u{2308}"),
    ("lcub", "{"),
    ("ldquo", "\u{201C}"),
    ("le", "\u{2264}"),
    ("lfloor", "\u{230A}"),
    ("lowast", "\u{2217}"),
    ("lowbar", "_"),
    ("loz", "\u{25CA}"),
    ("lpar", "("),
    ("lrm", "\u{200E}"),
    ("lsaquo", "\u{2039}"),
    ("lsqb", "["),
    ("lsquo", "\u{2018}"),
    ("lt", "<"),
    ("macr", "\u{AF}"),
    ("male", "\u{2642}"),
    ("mdash", "\u{2014}"),
    ("micro", "\u{B5}"),
    ("middot", "\u{B7}"),
    ("minus", "\u{2212}"),
    ("mldr", "\u{2026}"),
    ("mu", "\u{3BC}"),
    ("nabla", "\u{2207}"),
    ("natural", "\u{266E}"),
    ("nbsp", "\u{A0}"),
    ("ndash", "\u{2013}"),
    ("ne", "\u{2260}"),
    ("ni", "\u{220B}"),
    ("nldr", "\u{2025}"),
    ("not", "\u{AC}"),
    ("notin", "\u{2209}"),
    ("notinva", "\u{2209}"),
    ("nsub", "\u{2284}"),
    ("ntilde", "\u{F1}"),
    ("nu", "\u{3BD}"),
    ("num", "#"),
    ("nvgt", ">\u{20D2}"),
    ("nvlt", "<\u{20D2}"),
    ("oacute", "\u{F3}"),
    ("ocirc", "\u{F4}"),
    ("oelig", "\u{153}"),
    ("ograve", "\u{F2}"),
    ("oline", "\u{203E}"),
    ("omega", "\u{3C9}"),
    ("omicron", "\u{3BF}"),
    ("oplus", "\u{2295}"),
    ("or", "\u{2228}"),
    ("ordf", "\u{AA}"),
    ("ordm", "\u{BA}"),
    ("oslash", "\u{F8}"),
    ("otilde", "\u{F5}"),
    ("otimes", "\u{2297}"),
    ("ouml", "\u{F6}"),
    ("para", "\u{B6}"),
    ("part", "\u{2202}"),
    ("percnt", "%"),
    ("period", "."),
    ("permil", "\u{2030}"),
    ("perp", "\u{22A5}"),
    ("phi", "\u{3C6}"),
    ("phone", "\u{260E}"),
    ("pi", "\u{3C0}"),
    ("piv", "\u{3D6}"),
    ("plus", "+"),
    ("plusmn", "\u{B1}"),
    ("pound", "\u{A3}"),
    ("prime", "\u{2032}"),
    ("prod", "\u{220F}"),
    ("prop", "\u{221D}"),
    ("psi", "\u{3C8}"),
    ("quest", "?"),
    ("quot", "\""),
    ("rArr", "\u{21D2}"),
    ("radic", "\u{221A}"),
    ("rang", "\u{232A}"),
    ("raquo", "\u{BB}"),
    ("rarr", "\u{2192}"),
    ("rbrace", "}"),
    ("rbrack", "]"),
    ("rceil", "\u{2309}"),
    ("rcub", "}"),
    ("rdquo", "\u{201D}"),
    ("real", "\u{211C}"),
    ("reg", "\u{AE}"),
    ("rfloor", "\u{230B}"),
    ("rho", "\u{3C1}"),
    ("rlm", "\u{200F}"),
    ("rpar", ")"),
    ("rsaquo", "\u{203A}"),
    ("rsqb", "]"),
    ("rsquo", "\u{2019}"),
    ("sbquo", "\u{201A}"),
    ("scaron", "\u{161}"),
    ("sdot", "\u{22C5}"),
    ("sect", "\u{A7}"),
    ("semi", ";"),
    ("sharp", "\u{266F}"),
    ("shy", "\u{AD}"),
    ("sigma", "\u{3C3}"),
    ("sigmaf", "\u{3C2}"),
    ("sim", "\u{223C}"),
    ("sol", "/"),
    ("spades", "\u{2660}"),
    ("star", "\u{2606}"),
    ("starf", "\u{2605}"),
    ("sub", "\u{2282}"),
    ("sube", "\u{2286}"),
    ("sum", "\u{2211}"),
    ("sung", "\u{266A}"),
    ("sup", "\u{2283}"),
    ("sup1", "\u{B9}"),
    ("sup2", "\u{B2}"),
    ("sup3", "\u{B3}"),
    ("supe", "\u{2287}"),
    ("szlig", "\u{DF}"),
    ("tau", "\u{3C4}"),
    ("there4", "\u{2234}"),
    ("theta", "\u{3B8}"),
    ("thetasym", "\u{3D1}"),
    ("thinsp", "\u{2009}"),
    ("thorn", "\u{FE}"),
    ("tilde", "\u{2DC}"),
    ("times", "\u{D7}"),
    ("trade", "\u{2122}"),
    ("uArr", "\u{21D1}"),
    ("uacute", "\u{FA}"),
    ("uarr", "\u{2191}"),
    ("ucirc", "\u{FB}"),
    ("ugrave", "\u{F9}"),
    ("uml", "\u{A8}"),
    ("upsih", "\u{3D2}"),
    ("upsilon", "\u{3C5}"),
    ("uuml", "\u{FC}"),
    ("verbar", "|"),
    ("vert", "|"),
    ("weierp", "\u{2118}"),
    ("xi", "\u{3BE}"),
    ("yacute", "\u{FD}"),
    ("yen", "\u{A5}"),
    ("yuml", "\u{FF}"),
    ("zeta", "\u{3B6}"),
    ("zwj", "\u{200D}"),
    ("zwnj", "\u{200C}"),
];

/// Names the HTML parser accepts without a trailing `;`, sorted.
pub(super) static LEGACY: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml",
    "COPY", "Ccedil", "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT",
    "Iacute", "Icirc", "Igrave", "Iuml", "LT", "Ntilde", "Oacute", "Ocirc",
    "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN", "Uacute",
    "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig",
    "agrave", "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil",
    "cent", "copy", "curren", "deg", "divide", "eacute", "ecirc", "egrave",
    "eth", "euml", "frac12", "frac14", "frac34", "gt", "iacute", "icirc",
    "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf",
    "ordm", "oslash", "otilde", "ouml", "para", "plusmn", "pound", "quot",
    "raquo", "reg", "sect", "shy", "sup1", "sup2", "sup3", "szlig",
    "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml", "yacute",
    "yen", "yuml",
];

/// The only named references XML recognizes, sorted.
pub(super) static XML: &[(&str, &str)] = &[
    ("amp", "&"),
    ("apos", "'"),
    ("gt", ">"),
    ("lt", "<"),
    ("quot", "\""),
];

/// Replacements for numeric references in `0x80..=0x9F` (windows-1252).
pub(super) static C1_REPLACEMENTS: [(u32, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];
