// src/utils/feed.rs

//! Tolerant feed parser.
//!
//! Mirrors are uncontrolled and often serve malformed markup, so entries are
//! located by substring search instead of a strict XML parse. Any field that
//! cannot be found resolves to an empty string. Field text is decoded with
//! `scraper`'s HTML parser, which never fails on bad input.

use scraper::{Html, Node};

use crate::models::FeedEntry;

/// Parse up to `limit` entry blocks from a feed document.
pub fn parse_entries(body: &str, limit: usize) -> Vec<FeedEntry> {
    item_blocks(body)
        .take(limit)
        .map(|block| FeedEntry {
            title: field(block, "title"),
            description: html_to_text(&field(block, "description")),
            link: field(block, "link"),
            guid: field(block, "guid"),
        })
        .collect()
}

/// Iterate over the contents of `<item>` blocks, tolerating a missing close tag.
fn item_blocks(body: &str) -> impl Iterator<Item = &str> {
    body.split("<item>").skip(1).map(|chunk| match chunk.find("</item>") {
        Some(end) => &chunk[..end],
        None => chunk,
    })
}

/// Text of the first `<tag>` (attributes allowed) inside `block`.
fn field(block: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut rest = block;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        match after.chars().next() {
            Some('>') | Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                let Some(gt) = after.find('>') else {
                    return String::new();
                };
                if after[..gt].ends_with('/') {
                    return String::new();
                }
                let content = &after[gt + 1..];
                return match content.find(&close) {
                    Some(end) => unescape_xml(&content[..end]),
                    None => String::new(),
                };
            }
            // A longer tag name sharing the prefix, e.g. <titles>
            _ => rest = after,
        }
    }
    String::new()
}

/// Undo one level of XML escaping. CDATA content is already literal.
fn unescape_xml(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
    {
        return inner.trim().to_string();
    }
    Html::parse_fragment(trimmed)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Plain text of an HTML fragment; `<br>` and paragraph starts become newlines.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => match element.name() {
                "br" => out.push('\n'),
                "p" if !out.is_empty() && !out.ends_with('\n') => out.push('\n'),
                _ => {}
            },
            _ => {}
        }
    }
    out.trim().to_string()
}
