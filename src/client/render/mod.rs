//! Markdown to styled terminal text.


use console::style;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::fmt::Write as _;

#[derive(Debug, Default, Clone, Copy)]
struct InlineStyle {
    heading: bool,
    bold: bool,
    italic: bool,
    code_block: bool,
}

impl InlineStyle {
    fn apply(self, text: &str) -> String {
        let mut styled = style(text);
        if self.heading {
            styled = styled.yellow().bold();
        }
        if self.bold {
            styled = styled.bold();
        }
        if self.italic {
            styled = styled.italic();
        }
        styled.to_string()
    }
}

/// Render assistant markdown for the terminal. Colours follow
/// `console`'s detection, so piped output stays plain.
#[inline]
pub fn render_markdown(markdown: &str) -> String {
    let mut out = String::new();
    let mut inline = InlineStyle::default();
    // one entry per open list, holding the next number for ordered lists
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut link: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => inline.heading = true,
            Event::End(TagEnd::Heading(_)) => {
                inline.heading = false;
                out.push_str("\n\n");
            }
            Event::End(TagEnd::Paragraph) => {
                out.push('\n');
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Strong) => inline.bold = true,
            Event::End(TagEnd::Strong) => inline.bold = false,
            Event::Start(Tag::Emphasis) => inline.italic = true,
            Event::End(TagEnd::Emphasis) => inline.italic = false,
            Event::Start(Tag::CodeBlock(_)) => inline.code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                inline.code_block = false;
                out.push('\n');
            }
            Event::Start(Tag::List(start)) => {
                if !lists.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                out.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                match lists.last_mut() {
                    Some(Some(number)) => {
                        let _ = write!(out, "{number}. ");
                        *number += 1;
                    }
                    _ => out.push_str("• "),
                }
            }
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => link = Some(dest_url.to_string()),
            Event::End(TagEnd::Link) => {
                if let Some(url) = link.take() {
                    let _ = write!(out, " ({})", style(url).underlined());
                }
            }
            Event::Text(text) if inline.code_block => {
                for line in text.lines() {
                    out.push_str("    ");
                    out.push_str(&style(line).dim().to_string());
                    out.push('\n');
                }
            }
            Event::Text(text) => out.push_str(&inline.apply(&text)),
            Event::Code(code) => out.push_str(&style(code.as_ref()).cyan().to_string()),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("────────\n\n"),
            _ => {}
        }
    }

    out.trim_end().to_string()
}
