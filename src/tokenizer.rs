/// Splits raw text into lowercase word tokens.
///
/// Anything outside `[a-z0-9\s']` (after lowercasing) acts as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\'' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized.split_whitespace().map(str::to_owned).collect()
}
