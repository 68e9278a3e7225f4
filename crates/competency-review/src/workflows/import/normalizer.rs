/// Canonical column name: invisible characters stripped, lowercased, separators folded to `_`.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let folded = cleaned.replace('-', " ");
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join("_");
    collapsed.to_lowercase()
}
