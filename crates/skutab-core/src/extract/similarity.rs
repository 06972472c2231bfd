//! String similarity used to fold near-duplicate attribute names.
//!
//! Ratcliff/Obershelp "gestalt" matching: find the longest common block, recurse on the
//! pieces to its left and right, and score `2 * matched / (len_a + len_b)`. No characters are
//! treated as junk.
//!
//! The greedy block choice makes the raw score depend on argument order for some pairs
//! (`"Battery Life"` vs `"Weight"`), so [`ratio`] scores both orders and keeps the higher one.

/// Symmetric similarity ratio in `[0.0, 1.0]`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matched_chars(&a, &b).max(matched_chars(&b, &a));
    2.0 * matched as f64 / total as f64
}

/// Case-insensitive [`ratio`].
pub fn ratio_ignore_case(a: &str, b: &str) -> f64 {
    ratio(&a.to_lowercase(), &b.to_lowercase())
}

/// Total size of the matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, size)`.
///
/// Ties go to the block that starts earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // run[j + 1] = length of the common suffix ending at a[i - 1], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            cur[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identity_and_empty() {
        assert!(approx(ratio("Memory", "Memory"), 1.0));
        assert!(approx(ratio("", ""), 1.0));
        assert!(approx(ratio("abc", ""), 0.0));
        assert!(approx(ratio("abc", "xyz"), 0.0));
    }

    #[test]
    fn test_known_ratios() {
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        // "colo" + "r" matched out of 11 characters
        assert!(approx(ratio("color", "colour"), 10.0 / 11.0));
        assert!(approx(ratio("support phase", "supportphase"), 24.0 / 25.0));
    }

    #[test]
    fn test_symmetric_for_attribute_names() {
        let names = ["Battery Life", "Batterylife", "Colour", "Color", "Weight", "Net Weight"];
        for a in names {
            for b in names {
                assert!(approx(ratio(a, b), ratio(b, a)), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_order_dependent_pair_takes_higher_score() {
        assert!(approx(ratio("Battery Life", "Weight"), 4.0 / 18.0));
        assert!(approx(ratio("Weight", "Battery Life"), 4.0 / 18.0));
    }

    #[test]
    fn test_ignore_case() {
        assert!(approx(ratio_ignore_case("COLOR", "color"), 1.0));
        assert!(ratio("COLOR", "color") < 0.1);
    }

    #[test]
    fn test_recurses_on_both_sides() {
        // Longest block "bcd" in the middle, then "a" on the left and "e" on the right.
        assert!(approx(ratio("abcdxe", "aybcde"), 10.0 / 12.0));
    }
}
