use std::cmp::Ordering;

/// Human-friendly string ordering for names and labels.
///
/// Case-folded comparison first; on a tie, lowercase sorts before
/// uppercase ("apple" < "Apple" < "banana").
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| {
        a.chars()
            .map(char::is_uppercase)
            .cmp(b.chars().map(char::is_uppercase))
    })
}
