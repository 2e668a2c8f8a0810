//! # Fragment Scanning
//!
//! Note fields and card templates are HTML *fragments* owned by the host, which
//! is also responsible for sanitizing them. We never build a full document
//! tree. Instead this module offers the three tree operations the rest of the
//! crate needs, expressed over byte ranges of the original text:
//!
//! - **find**: locate elements by a predicate over tag and attributes
//!   ([`find_elements`], [`find_by_id`])
//! - **replace**: swap an element's outer markup for new markup ([`replace_element`])
//! - **decompose**: drop an element and everything inside it ([`remove_element`])
//!
//! Everything outside the touched ranges is preserved byte-for-byte, which is
//! what makes template synchronization idempotent: a fragment we did not need
//! to change is never re-serialized.
//!
//! ## Tokenizing
//!
//! Tags, attributes and character references are read by the `html5ever`
//! tokenizer, so unquoted values, entity forms and raw-text elements behave
//! as they do in the host's webview. The tokenizer does not report source
//! positions, so input is fed in chunks that each end just after a `>`: every
//! tag or comment is emitted while the chunk holding its closing `>` is fed,
//! which pins its end offset.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;
use std::ops::Range;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// An element located inside a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in source order; names lowercased, values entity-decoded.
    pub attrs: Vec<(String, String)>,
    /// Byte range of the whole element, start tag through end tag.
    pub outer: Range<usize>,
    /// Byte range between the start tag and the end tag.
    pub inner: Range<usize>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn inner_html<'a>(&self, html: &'a str) -> &'a str {
        &html[self.inner.clone()]
    }

    pub fn outer_html<'a>(&self, html: &'a str) -> &'a str {
        &html[self.outer.clone()]
    }

    /// Text content with tags stripped and entities decoded.
    pub fn text_content(&self, html: &str) -> String {
        scan(self.inner_html(html)).text
    }
}

/// A start or end tag with the byte range it occupies.
#[derive(Debug, Clone)]
struct RawTag {
    kind: TagKind,
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    span: Range<usize>,
}

enum Scanned {
    Tag(RawTag),
    /// Comment, doctype or bogus comment.
    Markup,
    Text(String),
}

#[derive(Default)]
struct FragmentSink {
    pending: RefCell<Vec<Scanned>>,
}

impl TokenSink for FragmentSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                let raw = match tag.kind {
                    TagKind::StartTag => raw_kind(&name),
                    TagKind::EndTag => None,
                };
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                self.pending.borrow_mut().push(Scanned::Tag(RawTag {
                    kind: tag.kind,
                    name,
                    attrs,
                    self_closing: tag.self_closing,
                    span: 0..0,
                }));
                if let Some(kind) = raw {
                    return TokenSinkResult::RawData(kind);
                }
            }
            Token::CharacterTokens(text) => {
                self.pending.borrow_mut().push(Scanned::Text(text.to_string()));
            }
            Token::NullCharacterToken => {
                self.pending.borrow_mut().push(Scanned::Text("\0".to_string()));
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) => {
                self.pending.borrow_mut().push(Scanned::Markup);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Elements whose content is text, not markup, as the tree builder would
/// switch them.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "textarea" | "title" => Some(RawKind::Rcdata),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Scan {
    tags: Vec<RawTag>,
    text: String,
}

fn scan(html: &str) -> Scan {
    let tokenizer = Tokenizer::new(FragmentSink::default(), TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    let mut result = Scan::default();
    let mut markup_end = 0;
    let mut fed = 0;

    for (pos, _) in html.match_indices('>') {
        let end = pos + 1;
        queue.push_back(StrTendril::from_slice(&html[fed..end]));
        let _ = tokenizer.feed(&mut queue);
        collect(&tokenizer.sink, html, end, &mut markup_end, &mut result);
        fed = end;
    }
    if fed < html.len() {
        queue.push_back(StrTendril::from_slice(&html[fed..]));
        let _ = tokenizer.feed(&mut queue);
    }
    tokenizer.end();
    collect(&tokenizer.sink, html, html.len(), &mut markup_end, &mut result);
    result
}

/// Assigns byte ranges to the tokens emitted while the input up to `end` was
/// fed. A tag ends at `end`; it starts at its own `<`, found after the end
/// of the previous tag or comment.
fn collect(sink: &FragmentSink, html: &str, end: usize, markup_end: &mut usize, scan: &mut Scan) {
    for item in sink.pending.borrow_mut().drain(..) {
        match item {
            Scanned::Text(text) => scan.text.push_str(&text),
            Scanned::Markup => *markup_end = end,
            Scanned::Tag(mut tag) => {
                let from = (*markup_end).min(end);
                let segment = &html[from..end];
                let start = match tag.kind {
                    TagKind::StartTag => segment
                        .as_bytes()
                        .windows(2)
                        .position(|w| w[0] == b'<' && w[1].is_ascii_alphabetic()),
                    TagKind::EndTag => segment.rfind("</"),
                };
                *markup_end = end;
                if let Some(start) = start {
                    tag.span = from + start..end;
                    scan.tags.push(tag);
                }
            }
        }
    }
}

/// Finds the outermost elements matching `pred`, in document order.
///
/// `pred` sees the tag name and attributes; the ranges are filled in once an
/// element matches. Matches never overlap: once an element matches, its
/// descendants are skipped. Elements whose end tag is missing are not
/// reported.
pub fn find_elements<F>(html: &str, pred: F) -> Vec<Element>
where
    F: Fn(&Element) -> bool,
{
    let tags = scan(html).tags;
    let mut found = Vec::new();
    let mut cursor = 0;

    for (i, tag) in tags.iter().enumerate() {
        if tag.kind != TagKind::StartTag || tag.span.start < cursor {
            continue;
        }
        let mut element = Element {
            tag: tag.name.clone(),
            attrs: tag.attrs.clone(),
            outer: tag.span.clone(),
            inner: tag.span.end..tag.span.end,
        };
        if !pred(&element) {
            continue;
        }
        if !tag.self_closing && !VOID_TAGS.contains(&tag.name.as_str()) {
            let Some(close) = find_close(&tags[i + 1..], &tag.name) else {
                continue;
            };
            element.inner = tag.span.end..close.start;
            element.outer = tag.span.start..close.end;
        }
        cursor = element.outer.end;
        found.push(element);
    }
    found
}

/// Finds the first element whose `id` attribute equals `id`.
pub fn find_by_id(html: &str, id: &str) -> Option<Element> {
    find_elements(html, |e| e.id() == Some(id)).into_iter().next()
}

/// Replaces byte ranges of `html`. Edits must not overlap.
pub fn splice(html: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (range, replacement) in edits {
        out.push_str(&html[last..range.start]);
        out.push_str(&replacement);
        last = range.end;
    }
    out.push_str(&html[last..]);
    out
}

pub fn replace_element(html: &str, element: &Element, replacement: &str) -> String {
    splice(html, vec![(element.outer.clone(), replacement.to_string())])
}

pub fn remove_element(html: &str, element: &Element) -> String {
    splice(html, vec![(element.outer.clone(), String::new())])
}

/// Replaces everything between an element's start and end tags.
pub fn replace_inner(html: &str, element: &Element, replacement: &str) -> String {
    splice(html, vec![(element.inner.clone(), replacement.to_string())])
}

/// Plain text of a whole fragment: comments and tags dropped, entities decoded.
pub fn strip_tags(html: &str) -> String {
    scan(html).text
}

/// Escapes text content. Lossless: [`unescape`] restores the input exactly.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            // Raw CR would be folded into LF when read back.
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes an attribute value for use inside double quotes.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decodes character references in escaped text. Unknown named references
/// are left as written.
pub fn unescape(text: &str) -> String {
    scan(text).text
}

fn find_close(tags: &[RawTag], name: &str) -> Option<Range<usize>> {
    let mut depth = 1usize;
    for tag in tags.iter().filter(|t| t.name == name) {
        match tag.kind {
            TagKind::EndTag => {
                depth -= 1;
                if depth == 0 {
                    return Some(tag.span.clone());
                }
            }
            TagKind::StartTag if !tag.self_closing => depth += 1,
            TagKind::StartTag => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_element_with_balanced_end_tag() {
        let html = r#"a<span id="x" class="one two"><span>in</span> more</span>b"#;
        let el = find_by_id(html, "x").unwrap();
        assert_eq!(el.tag, "span");
        assert!(el.has_class("two"));
        assert_eq!(el.inner_html(html), "<span>in</span> more");
        assert_eq!(&html[el.outer.end..], "b");
    }

    #[test]
    fn outermost_matches_only() {
        let html = r#"<div class="c"><div class="c">x</div></div><div class="c">y</div>"#;
        let found = find_elements(html, |e| e.has_class("c"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].inner_html(html), "y");
    }

    #[test]
    fn skips_elements_inside_comments() {
        let html = r#"<!-- <div id="r">old</div> --><div id="r">new</div>"#;
        let el = find_by_id(html, "r").unwrap();
        assert_eq!(el.inner_html(html), "new");
    }

    #[test]
    fn unclosed_element_is_not_reported() {
        let html = r#"<span id="x">dangling"#;
        assert!(find_by_id(html, "x").is_none());
    }

    #[test]
    fn void_and_self_closing_elements_have_empty_inner() {
        let html = r#"<br id="a"><img id="b"/>tail"#;
        let a = find_by_id(html, "a").unwrap();
        let b = find_by_id(html, "b").unwrap();
        assert!(a.inner.is_empty());
        assert_eq!(&html[b.outer.end..], "tail");
    }

    #[test]
    fn attribute_values_are_decoded() {
        let html = r#"<span data-x="a &amp; b" data-y='q' data-z=bare>t</span>"#;
        let el = find_elements(html, |e| e.tag == "span").remove(0);
        assert_eq!(el.attr("data-x"), Some("a & b"));
        assert_eq!(el.attr("data-y"), Some("q"));
        assert_eq!(el.attr("data-z"), Some("bare"));
    }

    #[test]
    fn escape_text_is_lossless() {
        let raw = "if a < b && c > d { \"&amp;\" }";
        assert_eq!(unescape(&escape_text(raw)), raw);
        let attr = r#"it's "quoted" <tag>"#;
        assert_eq!(unescape(&escape_attr(attr)), attr);
    }

    #[test]
    fn unescape_handles_numeric_and_unknown_entities() {
        assert_eq!(unescape("&#65;&#x42;&bogus;"), "AB&bogus;");
    }

    #[test]
    fn remove_and_replace_leave_surroundings_untouched() {
        let html = "<p>keep</p><div id=\"r\">x</div><p>keep</p>";
        let el = find_by_id(html, "r").unwrap();
        assert_eq!(remove_element(html, &el), "<p>keep</p><p>keep</p>");
        assert_eq!(
            replace_element(html, &el, "<b>y</b>"),
            "<p>keep</p><b>y</b><p>keep</p>"
        );
    }

    #[test]
    fn text_content_strips_tags() {
        let html = r#"<span id="s">a<br>b &lt;c&gt;</span>"#;
        let el = find_by_id(html, "s").unwrap();
        assert_eq!(el.text_content(html), "ab <c>");
    }

    #[test]
    fn strip_tags_drops_markup_and_comments() {
        assert_eq!(strip_tags("<!-- x --><b>{{c1::</b>a}}&amp;"), "{{c1::a}}&");
        assert_eq!(strip_tags("<br><div></div>").trim(), "");
    }

    #[test]
    fn unquoted_attribute_values_may_contain_equals() {
        let html = "<span class=anki-code-block data-raw-code=cHJpbnQoMSk= data-language=python>x</span>";
        let el = find_elements(html, |e| e.has_class("anki-code-block")).remove(0);
        assert_eq!(el.attr("data-raw-code"), Some("cHJpbnQoMSk="));
        assert_eq!(el.attr("data-language"), Some("python"));
        assert_eq!(el.outer, 0..html.len());
        assert_eq!(el.inner_html(html), "x");
    }

    #[test]
    fn predicate_sees_start_tags_outside_matches_before_ranges_resolve() {
        use std::cell::Cell;
        let calls = Cell::new(0);
        let html = "<p><span>a<p>b</span><p>c";
        let found = find_elements(html, |e| {
            calls.set(calls.get() + 1);
            assert!(e.inner.is_empty());
            e.tag == "span"
        });
        assert_eq!(calls.get(), 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner_html(html), "a<p>b");
    }

    #[test]
    fn raw_text_elements_hide_markup_inside() {
        let html = r#"<script>if (a<b) { x = "<span id='s'>"; }</script><span id="s">real</span>"#;
        let el = find_by_id(html, "s").unwrap();
        assert_eq!(el.inner_html(html), "real");
    }

    #[test]
    fn quoted_attribute_may_contain_angle_brackets() {
        let html = r#"<span title="a > b" id="t">in</span>"#;
        let el = find_by_id(html, "t").unwrap();
        assert_eq!(el.attr("title"), Some("a > b"));
        assert_eq!(el.inner_html(html), "in");
        assert_eq!(el.outer, 0..html.len());
    }

    #[test]
    fn carriage_returns_survive_escaping() {
        let raw = "line one\r\nline two";
        assert_eq!(unescape(&escape_text(raw)), raw);
    }
}
