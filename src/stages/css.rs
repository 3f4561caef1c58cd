// src/stages/css.rs

//! CSS prefixing, minification and unused-rule purging via `lightningcss`.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::Regex;
use tracing::debug;

/// Class and id selectors declared in a stylesheet. Over-matches (colour
/// hex values, file extensions), which is harmless: only selectors are ever
/// removed.
static SELECTOR_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.#](-?[_a-zA-Z][_a-zA-Z0-9-]*)").expect("selector regex is valid"));

static CONTENT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_a-zA-Z0-9-]+").expect("word regex is valid"));

/// Browser support used for vendor prefixing.
pub fn default_targets() -> Targets {
    Targets::from(Browsers {
        android: Some(version(4, 4)),
        chrome: Some(version(49, 0)),
        edge: Some(version(14, 0)),
        firefox: Some(version(45, 0)),
        ie: Some(version(11, 0)),
        ios_saf: Some(version(9, 0)),
        safari: Some(version(9, 0)),
        ..Browsers::default()
    })
}

fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

/// Add the vendor prefixes `targets` need, keeping the output readable.
pub fn prefix(css: &str, targets: Targets) -> Result<String> {
    transform(css, targets, HashSet::new(), false)
}

/// Minify, dropping comments and whitespace.
pub fn minify(css: &str, targets: Targets) -> Result<String> {
    transform(css, targets, HashSet::new(), true)
}

/// Remove rules whose class/id selectors are not mentioned anywhere in
/// `html_sources`, then minify.
///
/// Matching is by word, so a class referenced only from inline script text
/// is still kept.
pub fn purge_unused(css: &str, html_sources: &[String], targets: Targets) -> Result<String> {
    let used: HashSet<&str> = html_sources
        .iter()
        .flat_map(|html| CONTENT_WORD.find_iter(html).map(|m| m.as_str()))
        .collect();

    let unused: HashSet<String> = SELECTOR_SYMBOL
        .captures_iter(css)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|symbol| !used.contains(symbol))
        .map(str::to_string)
        .collect();

    debug!(unused = unused.len(), "purging unused css symbols");
    transform(css, targets, unused, true)
}

fn transform(css: &str, targets: Targets, unused_symbols: HashSet<String>, minify: bool) -> Result<String> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| anyhow!("parsing css: {e}"))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            unused_symbols,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("transforming css: {e}"))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("printing css: {e}"))?;

    Ok(printed.code)
}
