/// Comparison key for a title. Display and storage always keep the original text.
pub fn normalize_title(title: &str) -> String {
    title.to_lowercase()
}

pub fn titles_match(left: &str, right: &str) -> bool {
    normalize_title(left) == normalize_title(right)
}
