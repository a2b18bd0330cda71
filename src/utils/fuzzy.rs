// Fuzzy matching utilities for "did you mean" suggestions on names

/// Calculate Levenshtein distance between two strings
/// Returns the minimum number of single-character edits (insertions, deletions, substitutions)
/// needed to transform one string into another
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Two-row dynamic programming table
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Find near matches for a name among candidates (case-insensitive).
/// Prefix matches count as the number of extra characters.
/// Returns up to 5 matches sorted by distance (closest first).
pub fn find_near_matches(search: &str, candidates: &[String], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &candidate_lower);

        if distance <= max_distance {
            matches.push((candidate.clone(), distance));
        } else if search_lower.len() < candidate_lower.len() && candidate_lower.contains(&search_lower) {
            let extra = candidate_lower.len() - search_lower.len();
            let substring_distance = if candidate_lower.starts_with(&search_lower) {
                extra
            } else {
                extra + 1
            };
            if substring_distance <= max_distance + 2 {
                matches.push((candidate.clone(), substring_distance.min(max_distance)));
            }
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.into_iter().take(5).collect()
}

/// "not found" message with suggestions appended when any are close
pub fn not_found_message(kind: &str, search: &str, candidates: &[String]) -> String {
    let matches = find_near_matches(search, candidates, 3);
    if matches.is_empty() {
        format!("{} '{}' not found", kind, search)
    } else {
        let names: Vec<String> = matches.into_iter().map(|(name, _)| name).collect();
        format!("{} '{}' not found. Did you mean: {}?", kind, search, names.join(", "))
    }
}
