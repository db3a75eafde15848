//! "Did you mean" suggestions and identifier checks.

/// Closest candidate by edit distance (case-insensitive), if it is close enough
/// to be a plausible typo: at most half the longer of the two strings.
pub(crate) fn closest<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = input.to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| (candidate, edit_distance(&needle, &candidate.to_lowercase())))
        // min_by_key keeps the first of equally close candidates
        .min_by_key(|(_, distance)| *distance)
        .filter(|(candidate, distance)| *distance <= input.len().max(candidate.len()) / 2)
        .map(|(candidate, _)| candidate)
}

/// `Did you mean 'x'?` for the closest candidate.
pub(crate) fn did_you_mean<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    closest(input, candidates).map(|c| format!("Did you mean '{c}'?"))
}

/// Levenshtein distance over chars, single-row.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }

    row[b.len()]
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// Lowercase, hyphen-separated rewrite of an identifier: `At Risk_Rule` → `at-risk-rule`.
pub(crate) fn to_kebab_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
