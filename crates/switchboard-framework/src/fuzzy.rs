//! Typo-tolerant command resolution.
//!
//! When a typed command name is not registered, the [`FuzzyMatcher`] looks
//! for a registered name within a small Levenshtein distance. A suggestion
//! is only accepted when it is unambiguous: the closest candidate must be
//! strictly closer than every other candidate.

/// Default largest accepted edit distance.
pub const DEFAULT_MAX_DISTANCE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatcher {
    max_distance: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}

impl FuzzyMatcher {
    /// Creates a matcher accepting candidates at most `max_distance` edits away.
    pub fn new(max_distance: usize) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Returns the unique closest candidate to `token`, if it is within the
    /// threshold and strictly closer than the runner-up.
    pub fn best_match<'a, I>(&self, token: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ranked: Vec<(usize, &'a str)> = candidates
            .into_iter()
            .map(|candidate| (levenshtein(token, candidate), candidate))
            .collect();
        ranked.sort_unstable();

        match ranked.as_slice() {
            [] => None,
            [(best, _), (second, _), ..] if best == second => None,
            [(best, name), ..] if *best <= self.max_distance => Some(*name),
            _ => None,
        }
    }
}

/// Levenshtein distance over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    let mut prev_row: Vec<usize> = (0..=n).collect();
    let mut curr_row = vec![0usize; n + 1];

    for (i, a_ch) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_ch) in b_chars.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[n]
}
