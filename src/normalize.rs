use super::*;

use pulldown_cmark::{Event, Parser};

const STRAY_PUNCTUATION: &[char] = &[
    '`', '~', '*', '_', '-', '+', '=', '#', '>', '|', '•', '·', '.', ',', ';', ':',
];

const MAX_CLEAN_PASSES: usize = 8;

pub(super) fn normalize_items(text: &str) -> Vec<String> {
    let normalized = normalize_line_endings(text);
    let lines = unique_bounded(normalized.split('\n').map(str::to_string));
    let cleaned = lines
        .iter()
        .map(|line| clean_item_name(line))
        .filter(|name| !name.is_empty());
    unique_bounded(cleaned)
}

fn unique_bounded<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(content_hash(&item)) {
            out.push(item);
            if out.len() >= MAX_ITEMS_IN_LIST {
                break;
            }
        }
    }
    out
}

pub(super) fn clean_item_name(line: &str) -> String {
    let mut current = line.to_string();
    for _ in 0..MAX_CLEAN_PASSES {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    truncate_name(&current)
}

fn strip_once(line: &str) -> String {
    let plain = strip_markup(line);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    trim_stray(&collapsed).to_string()
}

fn trim_stray(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || STRAY_PUNCTUATION.contains(&c))
}

pub(super) fn strip_markup(line: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(line) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_ITEM_NAME_CHARS {
        return name.to_string();
    }
    let prefix: String = name.chars().take(MAX_ITEM_NAME_CHARS).collect();
    let mut cut = trim_stray(&prefix).to_string();
    cut.push('…');
    cut
}
