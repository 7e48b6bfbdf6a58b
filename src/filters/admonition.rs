use super::{FenceTracker, Filter};
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `!!! type "Title"`, or `???`/`???+` for collapsible details blocks
    static ref ADMONITION: Regex =
        Regex::new(r#"^(?:!!!|\?\?\?\+?)\s+([\w-]+)(?:[^"]*?)(?:\s+"([^"]*)")?\s*$"#)
            .expect("admonition pattern is a valid regex");
}

/// Turns admonition blocks into plain blockquotes.
///
/// Admonitions only render with the MkDocs `admonition` extension. Converting
/// them keeps their content readable in any Markdown processor:
///
/// ```text
/// !!! warning "Mind the gap"        > **Mind the gap**
///     Stand back from the edge.     >
///                                   > Stand back from the edge.
/// ```
#[derive(Debug, Default)]
pub struct AdmonitionFilter;

impl AdmonitionFilter {
    pub fn new() -> AdmonitionFilter {
        AdmonitionFilter
    }

    fn title(kind: &str, explicit: Option<&str>) -> Option<String> {
        match explicit {
            Some("") => None,
            Some(title) => Some(title.to_string()),
            None => {
                let mut chars = kind.chars();
                chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect())
            }
        }
    }
}

fn dedent(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

impl Filter for AdmonitionFilter {
    fn name(&self) -> &'static str {
        "admonition"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut fences = FenceTracker::default();
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            let caps = if fences.is_code(line) {
                None
            } else {
                ADMONITION.captures(line)
            };
            let Some(caps) = caps else {
                out.push(line.clone());
                i += 1;
                continue;
            };

            // the body is every indented line, blank lines included when more body follows
            let mut body = Vec::new();
            let mut end = i + 1;
            while end < lines.len() {
                if let Some(content) = dedent(&lines[end]) {
                    body.push(content.to_string());
                } else if lines[end].trim().is_empty()
                    && lines.get(end + 1).is_some_and(|next| dedent(next).is_some())
                {
                    body.push(String::new());
                } else {
                    break;
                }
                end += 1;
            }

            if let Some(title) =
                AdmonitionFilter::title(&caps[1], caps.get(2).map(|m| m.as_str()))
            {
                out.push(format!("> **{}**", title));
                if !body.is_empty() {
                    out.push(">".to_string());
                }
            }
            for content in body {
                if content.is_empty() {
                    out.push(">".to_string());
                } else {
                    out.push(format!("> {}", content));
                }
            }
            i = end;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn convert(text: &[&str]) -> Vec<String> {
        AdmonitionFilter::new().run(lines(text)).expect("infallible")
    }

    #[test]
    fn admonitions_become_blockquotes() {
        assert_eq!(
            convert(&[
                r#"!!! warning "Mind the gap""#,
                "    Stand back.",
                "",
                "    Really.",
                "",
                "After",
            ]),
            lines(&[
                "> **Mind the gap**",
                ">",
                "> Stand back.",
                ">",
                "> Really.",
                "",
                "After",
            ])
        );
    }

    #[test]
    fn titles_default_to_the_type() {
        assert_eq!(
            convert(&["??? note", "\tCollapsed"]),
            lines(&["> **Note**", ">", "> Collapsed"])
        );
        assert_eq!(
            convert(&[r#"!!! tip """#, "    No title"]),
            lines(&["> No title"])
        );
    }

    #[test]
    fn code_samples_are_left_alone() {
        let text = &["```", "!!! note", "    body", "```"];
        assert_eq!(convert(text), lines(text));
    }
}
