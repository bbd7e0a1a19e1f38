use std::collections::HashMap;

/// Ratcliff/Obershelp similarity: `2 * M / T`, where `M` is the number of
/// characters in the recursively found longest common blocks and `T` the
/// combined length of both strings. Two empty strings are identical.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (position, ch) in b.iter().enumerate() {
        b_index.entry(*ch).or_default().push(position);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
        let (i, j, size) = longest_match(a, &b_index, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            queue.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            queue.push((i + size, a_hi, j + size, b_hi));
        }
    }
    matched
}

/// Longest block `a[i..i+size] == b[j..j+size]` inside the given windows,
/// preferring the earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run lengths of matches ending at b[j], for the previous row of `a`
    let mut previous: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut current = HashMap::new();
        if let Some(positions) = b_index.get(ch) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let run = j.checked_sub(1).and_then(|k| previous.get(&k)).copied().unwrap_or(0) + 1;
                current.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        previous = current;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::sequence_ratio;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn ratio_matches_reference_values() {
        assert!(approx(sequence_ratio("abcd", "bcde"), 0.75));
        assert!(approx(sequence_ratio("apple", "appel"), 0.8));
        assert!(approx(sequence_ratio("acme corporation", "acme corporations"), 32.0 / 33.0));
    }

    #[test]
    fn identical_and_disjoint_strings_hit_the_bounds() {
        assert!(approx(sequence_ratio("northwind", "northwind"), 1.0));
        assert!(approx(sequence_ratio("abc", "xyz"), 0.0));
        assert!(approx(sequence_ratio("", ""), 1.0));
        assert!(approx(sequence_ratio("abc", ""), 0.0));
    }

    #[test]
    fn ratio_is_computed_over_characters_not_bytes() {
        assert!(approx(sequence_ratio("café", "cafe"), 0.75));
    }
}
