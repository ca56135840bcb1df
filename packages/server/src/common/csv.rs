//! Minimal CSV writing for exports.

/// Quote a field, doubling embedded quotes.
///
/// Every field is quoted so commas, quotes and newlines survive a round trip.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One CSV record, newline-terminated.
pub fn record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}
