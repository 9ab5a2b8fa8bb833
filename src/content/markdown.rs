//! Markdown body outline: code blocks, images and links
//!
//! The body is never rendered to HTML here. We only walk the
//! `pulldown-cmark` event stream to pull out the parts other tooling
//! cares about.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

/// A fenced or indented code block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Language tag from the fence info string (first word only)
    pub lang: Option<String>,
    pub code: String,
}

/// An image reference `![alt](src)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub alt: String,
    pub src: String,
}

/// A link `[label](target)`, also used for page link lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub target: String,
}

/// Structural summary of a Markdown body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub code_blocks: Vec<CodeBlock>,
    pub images: Vec<Image>,
    pub links: Vec<Link>,
    pub word_count: usize,
}

enum Capture {
    Code(Option<String>, String),
    Image(String, String),
    Link(String, String),
}

/// Walk a Markdown body and collect its outline
pub fn outline(markdown: &str) -> Outline {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut result = Outline::default();
    // Links can wrap images, so captures nest
    let mut stack: Vec<Capture> = Vec::new();

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|l| l.trim_matches(|c: char| c == '{' || c == '}' || c == '.'))
                        .filter(|l| !l.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                stack.push(Capture::Code(lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(Capture::Code(lang, code)) = stack.pop() {
                    result.code_blocks.push(CodeBlock { lang, code });
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                stack.push(Capture::Image(String::new(), dest_url.to_string()));
            }
            Event::End(TagEnd::Image) => {
                if let Some(Capture::Image(alt, src)) = stack.pop() {
                    push_text(&mut stack, &alt);
                    result.images.push(Image { alt, src });
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                stack.push(Capture::Link(String::new(), dest_url.to_string()));
            }
            Event::End(TagEnd::Link) => {
                if let Some(Capture::Link(label, target)) = stack.pop() {
                    push_text(&mut stack, &label);
                    result.links.push(Link {
                        label: label.trim().to_string(),
                        target,
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if !matches!(stack.last(), Some(Capture::Code(..))) {
                    result.word_count += text.split_whitespace().count();
                }
                push_text(&mut stack, &text);
            }
            Event::SoftBreak | Event::HardBreak => push_text(&mut stack, " "),
            _ => {}
        }
    }

    result
}

fn push_text(stack: &mut [Capture], text: &str) {
    match stack.last_mut() {
        Some(Capture::Code(_, buf)) | Some(Capture::Image(buf, _)) | Some(Capture::Link(buf, _)) => {
            buf.push_str(text)
        }
        None => {}
    }
}

/// Text before the excerpt separator, or the whole body if absent
///
/// With the default `"\n\n"` separator this is the first paragraph.
pub fn excerpt<'a>(body: &'a str, separator: &str) -> &'a str {
    let body = body.trim_start_matches(['\n', '\r']);
    if separator.is_empty() {
        return body.trim_end();
    }
    match body.find(separator) {
        Some(pos) => body[..pos].trim_end(),
        None => body.trim_end(),
    }
}
