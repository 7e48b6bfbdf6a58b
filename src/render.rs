//! HTML output for the combined document.
//!
//! Headings get ids from the same slugger the table of contents uses, so the
//! links generated for `[TOC]` markers and normalised cross references land on
//! real anchors.

use crate::filters::toc::Slugger;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

const PAGE_BREAK: &str = "\\newpage";

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render the combined lines as a standalone UTF-8 HTML document.
pub fn to_html(lines: &[String], title: Option<&str>) -> String {
    let markdown = lines
        .iter()
        .filter(|line| line.trim() != PAGE_BREAK)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    let mut events: Vec<Event<'_>> = Parser::new_ext(&markdown, parser_options()).collect();
    assign_heading_ids(&mut events);

    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, events.into_iter());

    let title = html_escape::encode_text(title.unwrap_or("Untitled"));
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        title, body
    )
}

fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut slugger = Slugger::default();
    for i in 0..events.len() {
        let explicit = match &events[i] {
            Event::Start(Tag::Heading { id, .. }) => id.as_ref().map(|id| id.to_string()),
            _ => continue,
        };
        match explicit {
            Some(id) => slugger.claim(&id),
            None => {
                let slug = slugger.slug(&heading_text(&events[i + 1..]));
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                    *id = Some(CowStr::from(slug));
                }
            }
        }
    }
}

/// Plain text of a heading, given the events that follow its start tag
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}
