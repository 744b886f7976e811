/// Case-sensitive fuzzy ranking over a flat list of candidates.
///
/// A candidate matches when every query character appears in it in order.
/// Matches are returned best first; candidates with equal scores keep the
/// order they were supplied in.
pub struct FuzzyMatcher<'a, T> {
    candidates: Vec<&'a T>,
    key: fn(&T) -> &str,
}

impl<'a, T> FuzzyMatcher<'a, T> {
    pub fn new(candidates: impl IntoIterator<Item = &'a T>, key: fn(&T) -> &str) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
            key,
        }
    }

    pub fn search(&self, query: &str) -> Vec<&'a T> {
        let mut scored: Vec<(&'a T, i32)> = self
            .candidates
            .iter()
            .filter_map(|&candidate| {
                fuzzy_score((self.key)(candidate), query).map(|score| (candidate, score))
            })
            .collect();
        // Stable, so ties stay in candidate order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(candidate, _)| candidate).collect()
    }
}

/// Score `candidate` against `query`; `None` when it does not match.
/// Higher scores indicate better matches.
pub fn fuzzy_score(candidate: &str, query: &str) -> Option<i32> {
    if query.is_empty() {
        return Some(100);
    }
    if candidate == query {
        return Some(1000);
    }

    let candidate_chars: Vec<char> = candidate.chars().collect();
    let query_chars: Vec<char> = query.chars().collect();

    let mut query_idx = 0;
    let mut score = 0;
    let mut consecutive_matches = 0;
    let mut last_match_idx: Option<usize> = None;

    for (idx, &c) in candidate_chars.iter().enumerate() {
        if query_idx == query_chars.len() {
            break;
        }
        if c != query_chars[query_idx] {
            continue;
        }
        query_idx += 1;

        if last_match_idx.is_some_and(|last| idx == last + 1) {
            consecutive_matches += 1;
            score += 10 + consecutive_matches;
        } else {
            consecutive_matches = 0;
            score += 5;
        }

        // Word boundaries: camelCase humps and namespace or underscore separators.
        let at_boundary = c.is_ascii_uppercase()
            || idx == 0
            || matches!(candidate_chars[idx - 1], '.' | '_');
        if at_boundary {
            score += 15;
        }

        if idx < candidate_chars.len() / 2 {
            score += 3;
        }

        last_match_idx = Some(idx);
    }

    if query_idx < query_chars.len() {
        return None;
    }

    // Prefer shorter names.
    let length_penalty = candidate_chars.len() as i32 / 10;
    score = (score - length_penalty).max(1);

    if candidate.starts_with(query) {
        score += 50;
    }

    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(s: &String) -> &str {
        s.as_str()
    }

    #[test]
    fn test_subsequence_match() {
        assert!(fuzzy_score("getUserName", "gUN").is_some());
        assert!(fuzzy_score("getUserName", "xyz").is_none());
        assert!(fuzzy_score("abc", "cba").is_none());
    }

    #[test]
    fn test_case_sensitive() {
        assert!(fuzzy_score("Alpha", "alpha").is_none());
        assert!(fuzzy_score("alpha", "alp").is_some());
    }

    #[test]
    fn test_exact_beats_prefix_beats_scattered() {
        let exact = fuzzy_score("trade", "trade").unwrap();
        let prefix = fuzzy_score("trades", "trade").unwrap();
        let scattered = fuzzy_score("t_r_a_d_e", "trade").unwrap();
        assert!(exact > prefix);
        assert!(prefix > scattered);
    }

    #[test]
    fn test_search_ranks_best_first() {
        let names: Vec<String> = vec!["xgx".into(), "g".into(), "gsum".into(), "h".into()];
        let matcher = FuzzyMatcher::new(&names, identity);
        let found: Vec<&str> = matcher.search("g").into_iter().map(String::as_str).collect();
        assert_eq!(found, vec!["g", "gsum", "xgx"]);
    }

    #[test]
    fn test_empty_query_matches_everything_in_order() {
        let names: Vec<String> = vec!["b".into(), "a".into()];
        let matcher = FuzzyMatcher::new(&names, identity);
        assert_eq!(matcher.search("").len(), 2);
        assert_eq!(matcher.search("")[0], "b");
    }
}
