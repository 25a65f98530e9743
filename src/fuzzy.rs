//! Edit distance and "did you mean" suggestions.

/// Levenshtein distance over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Largest distance a suggestion may have from `lookup`: a third of its
/// length, never less than one.
pub fn suggestion_threshold(lookup: &str) -> usize {
    lookup.chars().count().max(3) / 3
}

/// The candidate closest to `lookup`, if any is within the suggestion
/// threshold. Comparison is case-insensitive; ties go to the earliest
/// candidate.
pub fn best_match<'a, I>(lookup: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = lookup.to_lowercase();
    let threshold = suggestion_threshold(lookup);
    candidates
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| (edit_distance(&needle, &c.to_lowercase()), c))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, c)| c)
}
