//! Set and string similarity used by the reference relatedness measure.

use std::collections::HashSet;
use std::hash::Hash;

/// Jaccard coefficient of two sets. Two empty sets score 0.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use entlink::similarity::jaccard;
///
/// let a: HashSet<_> = ["capitals", "france"].into_iter().collect();
/// let b: HashSet<_> = ["france", "communes"].into_iter().collect();
/// assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Case-folded set of category titles.
#[must_use]
pub fn title_set<'a>(titles: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    titles
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Jaccard similarity of two category-title lists, case-insensitive.
#[must_use]
pub fn category_similarity<'a, 'b>(
    a: impl IntoIterator<Item = &'a str>,
    b: impl IntoIterator<Item = &'b str>,
) -> f64 {
    jaccard(&title_set(a), &title_set(b))
}

/// Jaccard similarity on lowercased word sets.
///
/// ```
/// use entlink::similarity::jaccard_word_similarity;
///
/// // "Apple Inc" and "Apple" share 1 word, union has 2 words
/// let sim = jaccard_word_similarity("Apple Inc", "apple");
/// assert!((sim - 0.5).abs() < 0.001);
/// ```
#[must_use]
pub fn jaccard_word_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    jaccard(&words_a, &words_b)
}
