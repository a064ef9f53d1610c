//! WikiText to plaintext converter
//!
//! Converts MediaWiki markup to the plain text stored in dataset records.
//! Block-level markup (comments, references, templates, tables) is removed
//! from the whole article first; the rest is cleaned one section at a time
//! and the sections are joined with a blank line.

use regex::{Captures, Regex};
use std::sync::OnceLock;

static RE_NOWIKI: OnceLock<Regex> = OnceLock::new();
static RE_COMMENT: OnceLock<Regex> = OnceLock::new();
static RE_REF_SELF_CLOSING: OnceLock<Regex> = OnceLock::new();
static RE_REF: OnceLock<Regex> = OnceLock::new();
static RE_HTML_TABLE: OnceLock<Regex> = OnceLock::new();
static RE_HEADING: OnceLock<Regex> = OnceLock::new();
static RE_EXTERNAL_LINK: OnceLock<Regex> = OnceLock::new();
static RE_EXTERNAL_BARE: OnceLock<Regex> = OnceLock::new();
static RE_HTML_TAG: OnceLock<Regex> = OnceLock::new();
static RE_ENTITY: OnceLock<Regex> = OnceLock::new();
static RE_LIST: OnceLock<Regex> = OnceLock::new();
static RE_RULE: OnceLock<Regex> = OnceLock::new();
static RE_MAGIC_WORDS: OnceLock<Regex> = OnceLock::new();

/// Namespaces whose links are dropped outright
const DROPPED_LINK_PREFIXES: &[&str] = &[
    "file:",
    "image:",
    "media:",
    "category:",
    "datei:",
    "fichier:",
    "archivo:",
    "kategorie:",
    "catégorie:",
    "categoría:",
];

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static wikitext pattern"))
}

/// WikiText parser that converts MediaWiki markup to plain text
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiTextParser;

impl WikiTextParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse WikiText and return clean plaintext
    pub fn parse(&self, wikitext: &str) -> String {
        let mut text = self.handle_nowiki(wikitext);
        text = self.remove_comments(&text);
        text = self.remove_references(&text);
        text = self.remove_templates(&text);
        text = self.remove_tables_markup(&text);

        let sections: Vec<String> = split_sections(&text)
            .into_iter()
            .map(|section| self.clean_section(&section))
            .filter(|section| !section.is_empty())
            .collect();
        sections.join("\n\n")
    }

    /// Inline cleanup of one section (heading line included)
    fn clean_section(&self, section: &str) -> String {
        let mut text = self.process_internal_links(section);
        text = self.process_external_links(&text);
        text = self.strip_html_tags(&text);
        text = self.process_formatting(&text);
        text = self.remove_magic_words(&text);
        text = self.decode_entities(&text);
        self.clean_whitespace(&text)
    }

    /// <nowiki> and <pre> keep their content verbatim
    fn handle_nowiki(&self, text: &str) -> String {
        let re = regex(&RE_NOWIKI, r"(?is)<(nowiki|pre)(?:\s[^>]*)?>(.*?)</(?:nowiki|pre)>");
        re.replace_all(text, "$2").into_owned()
    }

    fn remove_comments(&self, text: &str) -> String {
        let re = regex(&RE_COMMENT, r"(?s)<!--.*?(?:-->|$)");
        re.replace_all(text, "").into_owned()
    }

    /// Remove <ref>...</ref> and <ref .../> tags
    fn remove_references(&self, text: &str) -> String {
        let self_closing = regex(&RE_REF_SELF_CLOSING, r"(?i)<ref(?:\s[^>]*)?/>");
        let text = self_closing.replace_all(text, "");
        let paired = regex(&RE_REF, r"(?is)<ref(?:\s[^>]*)?>.*?</ref\s*>");
        paired.replace_all(&text, "").into_owned()
    }

    /// Remove templates {{ ... }} and parameters {{{ ... }}}, nested ones included
    fn remove_templates(&self, text: &str) -> String {
        remove_nested(text, &[("{{{", "}}}"), ("{{", "}}")])
    }

    /// Remove wiki tables {| ... |} and HTML <table> blocks
    fn remove_tables_markup(&self, text: &str) -> String {
        let text = remove_nested(text, &[("{|", "|}")]);
        let re = regex(&RE_HTML_TABLE, r"(?is)<table(?:\s[^>]*)?>.*?</table\s*>");
        re.replace_all(&text, "").into_owned()
    }

    /// [[target]] -> target, [[target|label]] -> label.
    /// File, category and interwiki links are dropped.
    fn process_internal_links(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if !(c == '[' && chars.peek() == Some(&'[')) {
                result.push(c);
                continue;
            }
            chars.next();

            // Read until the matching ]]
            let mut link = String::new();
            let mut depth = 1;
            while let Some(ch) = chars.next() {
                if ch == '[' && chars.peek() == Some(&'[') {
                    chars.next();
                    depth += 1;
                    link.push_str("[[");
                } else if ch == ']' && chars.peek() == Some(&']') {
                    chars.next();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    link.push_str("]]");
                } else {
                    link.push(ch);
                }
            }

            let (target, label) = match link.find('|') {
                Some(pipe) => (&link[..pipe], Some(&link[pipe + 1..])),
                None => (link.as_str(), None),
            };

            // [[:Category:X]] is a plain link to the category page
            let (target, colon_escaped) = match target.strip_prefix(':') {
                Some(rest) => (rest, true),
                None => (target, false),
            };

            if !colon_escaped && (is_dropped_namespace(target) || is_interwiki(target)) {
                continue;
            }

            match label {
                Some(label) => result.push_str(&self.process_internal_links(label)),
                None => result.push_str(target.trim()),
            }
        }

        result
    }

    /// [url text] -> text; bare [url] is dropped
    fn process_external_links(&self, text: &str) -> String {
        let re = regex(&RE_EXTERNAL_LINK, r"\[(?:https?:)?//[^\s\]]+\s+([^\]]+)\]");
        let result = re.replace_all(text, "$1");
        let re_bare = regex(&RE_EXTERNAL_BARE, r"\[(?:https?:)?//[^\s\]]+\]");
        re_bare.replace_all(&result, "").into_owned()
    }

    /// Drop remaining tags, keep their content
    fn strip_html_tags(&self, text: &str) -> String {
        let re = regex(&RE_HTML_TAG, r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^<>]*)?/?>");
        re.replace_all(text, "").into_owned()
    }

    fn process_formatting(&self, text: &str) -> String {
        let mut result = text.replace("'''''", "").replace("'''", "").replace("''", "");

        let heading = regex(&RE_HEADING, r"(?m)^(={1,6})\s*(.*?)\s*={1,6}[ \t]*$");
        result = heading.replace_all(&result, "$2").into_owned();

        let rule = regex(&RE_RULE, r"(?m)^-{4,}[ \t]*$");
        result = rule.replace_all(&result, "").into_owned();

        // Bullets, numbering, indents and definition markers
        let list = regex(&RE_LIST, r"(?m)^[*#:;]+[ \t]*");
        list.replace_all(&result, "").into_owned()
    }

    /// __NOTOC__, __TOC__, ...
    fn remove_magic_words(&self, text: &str) -> String {
        let re = regex(&RE_MAGIC_WORDS, r"__[A-Z]+__");
        re.replace_all(text, "").into_owned()
    }

    fn decode_entities(&self, text: &str) -> String {
        let re = regex(&RE_ENTITY, r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});");
        re.replace_all(text, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
    }

    /// Collapse runs of spaces and blank lines
    fn clean_whitespace(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for line in text.lines() {
            let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if line.is_empty() {
                continue;
            }
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&line);
        }
        result
    }
}

/// Split into the lead section plus one section per heading line
fn split_sections(text: &str) -> Vec<String> {
    let heading = regex(&RE_HEADING, r"(?m)^(={1,6})\s*(.*?)\s*={1,6}[ \t]*$");
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if heading.is_match(line) && !current.trim().is_empty() {
            sections.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        sections.push(current);
    }
    sections
}

/// Remove balanced spans delimited by any of `pairs`, counting nesting.
/// Openers are tried in order, so list longer ones first; a closer only
/// counts when it matches the innermost open span. An unbalanced opener
/// swallows the rest of the text.
fn remove_nested(text: &str, pairs: &[(&str, &'static str)]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut open: Vec<&'static str> = Vec::new();
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        for &(opener, closer) in pairs {
            if rest.starts_with(opener) {
                open.push(closer);
                rest = &rest[opener.len()..];
                continue 'scan;
            }
        }
        if let Some(&closer) = open.last() {
            if rest.starts_with(closer) {
                rest = &rest[closer.len()..];
                open.pop();
                continue;
            }
        } else {
            result.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    result
}

fn is_dropped_namespace(target: &str) -> bool {
    let lower = target.trim_start().to_lowercase();
    DROPPED_LINK_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// `de:Albert Einstein`, `zh-yue:...`: a language prefix before the colon
fn is_interwiki(target: &str) -> bool {
    let Some((prefix, _)) = target.split_once(':') else {
        return false;
    };
    let mut parts = prefix.split('-');
    let lang_ok = parts
        .next()
        .map(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_lowercase()))
        .unwrap_or(false);
    lang_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match name {
        "nbsp" | "ensp" | "emsp" | "thinsp" => " ",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "minus" => "\u{2212}",
        "times" => "\u{00d7}",
        "hellip" => "\u{2026}",
        "deg" => "\u{00b0}",
        "copy" => "\u{00a9}",
        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        _ => return None,
    };
    Some(decoded.to_string())
}
