//! Helpers over opaque content items.
//!
//! Items are treated as indivisible strings; the only inspection ever done is locating an
//! `<img>` tag for the minimal (`image`) layout.
use crate::group::LayoutMode;

/// Split raw operator text into content items.
///
/// Items are separated by blank (whitespace-only) lines and trimmed; empty items are dropped.
/// Text without any blank-line separator is one single item.
pub fn parse_products(raw: &str) -> Vec<String> {
    let normalized = raw.replace("\r\n", "\n");

    let mut items = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in normalized.split('\n') {
        if line.trim().is_empty() {
            flush_block(&mut block, &mut items);
        } else {
            block.push(line);
        }
    }
    flush_block(&mut block, &mut items);
    items
}

fn flush_block(block: &mut Vec<&str>, items: &mut Vec<String>) {
    if block.is_empty() {
        return;
    }
    let joined = block.join("\n");
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        items.push(trimmed.to_string());
    }
    block.clear();
}

/// Reduce an item to its image tag.
///
/// An item that already is an `<img ...>` tag is kept as is; otherwise the first `<img ...>`
/// tag inside it is returned; items without one are returned unchanged.
pub fn extract_image(item: &str) -> String {
    let trimmed = item.trim_start();
    let lower = item.to_ascii_lowercase();

    if is_img_tag_start(&trimmed.to_ascii_lowercase()) {
        return item.to_string();
    }

    let Some(start) = lower.find("<img") else {
        return item.to_string();
    };
    match item[start..].find('>') {
        Some(end) => item[start..start + end + 1].to_string(),
        None => item.to_string(),
    }
}

fn is_img_tag_start(lower: &str) -> bool {
    lower
        .strip_prefix("<img")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Prepare items for publishing under the given layout.
pub fn for_layout(items: &[String], layout: LayoutMode) -> Vec<String> {
    match layout {
        LayoutMode::Card => items.to_vec(),
        LayoutMode::Image => items.iter().map(|i| extract_image(i)).collect(),
    }
}
