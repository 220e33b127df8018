//! Ticker symbol derivation from a collection name.

/// Derives a two-character symbol from a collection name.
///
/// With several words the initials are used; a single word stands for
/// itself. The first and last character of that string are then
/// uppercased: `"My Cool Apes"` gives `"MA"`, `"Apes"` gives `"AS"` and
/// `"A"` gives `"AA"`. A blank name yields an empty string.
pub fn derive_symbol(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let source: String = match words.as_slice() {
        [] => return String::new(),
        [word] => (*word).to_string(),
        words => words.iter().filter_map(|w| w.chars().next()).collect(),
    };

    let (Some(first), Some(last)) = (source.chars().next(), source.chars().last()) else {
        return String::new();
    };

    first.to_uppercase().chain(last.to_uppercase()).collect()
}
