//! Conversion of pipe tables into fixed-width grid tables.
//!
//! Pipe tables have no notion of column width, so long cells produce lines
//! that run off the page once the document is typeset. Grid tables spell out
//! every column's width and wrap cell contents inside it:
//!
//! ```text
//! +-----------+---------------------+
//! | Option    | Meaning             |
//! +:==========+====================:+
//! | --width   | Width of generated  |
//! |           | tables              |
//! +-----------+---------------------+
//! ```
//!
//! The whole table is fitted into a configured width. Every column first gets
//! room for its longest word (when there is enough room to go around), then the
//! remaining space is shared out in proportion to each column's natural width.

use super::{FenceTracker, Filter};
use anyhow::Result;
use std::cmp::Reverse;
use textwrap::core::display_width;

/// Horizontal alignment of a column, as marked in the separator row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Default,
    Left,
    Center,
    Right,
}

impl Alignment {
    fn from_marker(marker: &str) -> Option<Alignment> {
        let inner = marker.trim_start_matches(':').trim_end_matches(':');
        if inner.is_empty() || !inner.chars().all(|c| c == '-') {
            return None;
        }
        Some(match (marker.starts_with(':'), marker.ends_with(':')) {
            (true, true) => Alignment::Center,
            (true, false) => Alignment::Left,
            (false, true) => Alignment::Right,
            (false, false) => Alignment::Default,
        })
    }

    /// The `=` segment of the header separator for a column `width` wide
    fn header_rule(self, width: usize) -> String {
        match self {
            Alignment::Default => "=".repeat(width + 2),
            Alignment::Left => format!(":{}", "=".repeat(width + 1)),
            Alignment::Right => format!("{}:", "=".repeat(width + 1)),
            Alignment::Center => format!(":{}:", "=".repeat(width)),
        }
    }

    fn justify(self, text: &str, width: usize) -> String {
        let padding = width.saturating_sub(display_width(text));
        match self {
            Alignment::Default | Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left = padding / 2;
                format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
            }
        }
    }
}

/// Rewrites pipe tables as grid tables no wider than `width` characters.
#[derive(Debug)]
pub struct TableFilter {
    width: usize,
}

impl TableFilter {
    pub fn new(width: usize) -> TableFilter {
        TableFilter { width }
    }

    /// Convert one table block (header, separator, rows); `None` if it is malformed.
    fn convert(&self, block: &[String]) -> Option<Vec<String>> {
        let [header, separator, body @ ..] = block else {
            return None;
        };
        let alignments = parse_separator(separator)?;
        let columns = alignments.len();

        let header = split_row(header);
        let rows: Vec<Vec<String>> = body.iter().map(|line| split_row(line)).collect();
        if header.len() != columns || rows.iter().any(|row| row.len() != columns) {
            return None;
        }

        let all_rows = || std::iter::once(&header).chain(rows.iter());
        let natural: Vec<usize> = (0..columns)
            .map(|j| all_rows().map(|row| display_width(&row[j])).max().unwrap_or(0).max(1))
            .collect();
        let longest_words: Vec<usize> = (0..columns)
            .map(|j| {
                all_rows()
                    .flat_map(|row| row[j].split_whitespace().map(display_width))
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();

        let available = self.width.saturating_sub(1 + 3 * columns);
        let widths = column_widths(&natural, &longest_words, available);

        let mut out = Vec::new();
        out.push(rule(&widths, |w, _| "-".repeat(w + 2), &alignments));
        out.extend(row_lines(&header, &widths, &alignments));
        out.push(rule(&widths, |w, align| align.header_rule(w), &alignments));
        for row in &rows {
            out.extend(row_lines(row, &widths, &alignments));
            out.push(rule(&widths, |w, _| "-".repeat(w + 2), &alignments));
        }
        Some(out)
    }
}

/// Split a table row into trimmed cells, honouring `\|` escapes.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = match inner.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            _ if escaped => {
                cell.push(c);
                escaped = false;
            }
            '\\' => {
                cell.push(c);
                escaped = true;
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('|') || !line.contains('-') {
        return None;
    }
    split_row(line)
        .iter()
        .map(|cell| Alignment::from_marker(cell))
        .collect()
}

fn is_row(line: &str) -> bool {
    line.contains('|') && !line.trim().is_empty()
}

/// Split `total` in proportion to `weights`, handing leftovers to the largest remainders.
fn proportional(total: usize, weights: &[usize]) -> Vec<usize> {
    let sum: usize = weights.iter().sum();
    if weights.is_empty() || sum == 0 {
        return vec![total / weights.len().max(1); weights.len()];
    }
    let mut parts: Vec<usize> = weights.iter().map(|w| total * w / sum).collect();
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by_key(|&j| Reverse(total * weights[j] % sum));
    let leftover = total - parts.iter().sum::<usize>();
    for &j in order.iter().take(leftover) {
        parts[j] += 1;
    }
    parts
}

fn column_widths(natural: &[usize], longest_words: &[usize], available: usize) -> Vec<usize> {
    let columns = natural.len();
    if available <= columns {
        return vec![1; columns];
    }

    let reserved: usize = longest_words.iter().sum();
    if reserved <= available {
        let shares = proportional(available - reserved, natural);
        longest_words.iter().zip(shares).map(|(w, s)| w + s).collect()
    } else {
        // not enough room for whole words, so some will be broken
        proportional(available - columns, natural)
            .into_iter()
            .map(|w| w + 1)
            .collect()
    }
}

fn rule<F>(widths: &[usize], segment: F, alignments: &[Alignment]) -> String
where
    F: Fn(usize, Alignment) -> String,
{
    let mut line = String::from("+");
    for (&width, &align) in widths.iter().zip(alignments) {
        line.push_str(&segment(width, align));
        line.push('+');
    }
    line
}

fn row_lines(cells: &[String], widths: &[usize], alignments: &[Alignment]) -> Vec<String> {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let lines: Vec<String> = textwrap::wrap(cell, width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect();
            if lines.is_empty() {
                vec![String::new()]
            } else {
                lines
            }
        })
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    (0..height)
        .map(|i| {
            let mut line = String::from("|");
            for ((cell, &width), &align) in wrapped.iter().zip(widths).zip(alignments) {
                let text = cell.get(i).map(String::as_str).unwrap_or("");
                line.push(' ');
                line.push_str(&align.justify(text, width));
                line.push_str(" |");
            }
            line
        })
        .collect()
}

impl Filter for TableFilter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn run(&self, lines: Vec<String>) -> Result<Vec<String>> {
        let mut fences = FenceTracker::default();
        let mut out = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            let starts_table = !fences.is_code(line)
                && is_row(line)
                && lines
                    .get(i + 1)
                    .is_some_and(|next| parse_separator(next).is_some());
            if !starts_table {
                out.push(line.clone());
                i += 1;
                continue;
            }

            let mut end = i + 2;
            while end < lines.len() && is_row(&lines[end]) {
                end += 1;
            }
            let block = &lines[i..end];
            match self.convert(block) {
                Some(grid) => out.extend(grid),
                None => {
                    log::warn!("leaving malformed table at line {} unconverted", i + 1);
                    out.extend(block.iter().cloned());
                }
            }
            i = end;
        }

        Ok(out)
    }
}
