//! Best-effort parser for the Prometheus text exposition format.
//!
//! Parsing works one line at a time and never fails as a whole: lines that
//! cannot be understood are skipped and the rest of the payload is still used.
//! Live targets restart, truncate output and mix exposition versions, so a
//! partially readable document is the normal case, not an error.

use std::collections::BTreeMap;
use tracing::trace;

use crate::snapshot::{Labels, MetricMap, MetricType, Sample};

/// Parsed samples plus the `# TYPE` hints that accompanied them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metrics: MetricMap,
    pub types: BTreeMap<String, MetricType>,
}

/// Parses exposition text into samples grouped by metric name.
///
/// Blank lines and `#` comment lines are ignored. Lines whose trailing value
/// token is not a finite number are skipped.
pub fn parse(text: &str) -> MetricMap {
    let mut metrics = MetricMap::new();
    for line in text.lines() {
        if let Some(sample) = parse_line(line) {
            metrics.entry(sample.name.clone()).or_default().push(sample);
        }
    }
    metrics
}

/// Parses the samples and collects `# TYPE` hints in a single pass.
pub fn parse_document(text: &str) -> Document {
    let mut document = Document::default();
    for line in text.lines() {
        if let Some((name, kind)) = parse_type_hint(line) {
            document.types.insert(name.to_string(), kind);
        } else if let Some(sample) = parse_line(line) {
            document
                .metrics
                .entry(sample.name.clone())
                .or_default()
                .push(sample);
        }
    }
    document
}

/// Collects `# TYPE <name> <kind>` hints only.
pub fn parse_type_hints(text: &str) -> BTreeMap<String, MetricType> {
    text.lines().filter_map(parse_type_hint).map(|(n, k)| (n.to_string(), k)).collect()
}

fn parse_type_hint(line: &str) -> Option<(&str, MetricType)> {
    let rest = line.trim().strip_prefix('#')?.trim_start().strip_prefix("TYPE")?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?;
    let kind = MetricType::from_keyword(tokens.next()?)?;
    Some((name, kind))
}

/// Parses a single exposition line into a sample.
///
/// Returns `None` for blank lines, comments and malformed lines.
pub fn parse_line(raw: &str) -> Option<Sample> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let Some((metric_part, value_part)) = line.rsplit_once(char::is_whitespace) else {
        trace!("Skipping line without value token: {}", line);
        return None;
    };

    let value = match value_part.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            trace!("Skipping line with non-numeric value: {}", line);
            return None;
        }
    };

    let metric_part = metric_part.trim_end();
    let (name, labels) = match metric_part.find('{') {
        Some(start) => {
            let end = metric_part.rfind('}').filter(|&e| e > start).unwrap_or(metric_part.len());
            (&metric_part[..start], parse_labels(&metric_part[start + 1..end]))
        }
        None => (metric_part, Labels::new()),
    };

    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(Sample::new(name, labels, value))
}

/// Parses the text between `{` and `}`. Malformed pairs are dropped, the
/// remaining pairs of the same line are kept.
fn parse_labels(body: &str) -> Labels {
    let mut labels = Labels::new();
    for token in split_label_pairs(body) {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        labels.insert(key.to_string(), unquote(value));
    }
    labels
}

/// Splits on commas that are not inside a quoted value.
fn split_label_pairs(body: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                pairs.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pairs.push(&body[start..]);
    pairs.retain(|p| !p.trim().is_empty());
    pairs
}

/// Strips one pair of surrounding quotes and resolves escape sequences.
fn unquote(value: &str) -> String {
    let value = value.strip_prefix('"').unwrap_or(value);
    let value = value.strip_suffix('"').unwrap_or(value);

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
