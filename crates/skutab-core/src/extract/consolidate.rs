//! Fuzzy folding of near-duplicate attribute names.
//!
//! Names are visited in first-seen order and compared (case-insensitively) against the
//! canonical names collected so far. The first canonical name scoring above the threshold
//! absorbs the values; otherwise the name becomes canonical itself. The merge is greedy and
//! order-dependent: with `Colour`, `Color`, `Colors` the last one starts its own bucket because
//! it is only compared with `Colour`, while `Color`, `Colour`, `Colors` collapses into one.

use super::bucket::AttributeBucket;
use super::similarity::ratio_ignore_case;

/// Names scoring strictly above this are treated as the same attribute.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Accumulates canonical attribute buckets across many inputs.
#[derive(Debug, Clone)]
pub struct Consolidator {
    threshold: f64,
    canonical: AttributeBucket,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Consolidator {
    pub fn new() -> Self {
        Self::with_threshold(SIMILARITY_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            canonical: AttributeBucket::new(),
        }
    }

    /// First canonical name whose similarity to `name` exceeds the threshold.
    pub fn find_canonical(&self, name: &str) -> Option<&str> {
        self.canonical
            .iter()
            .map(|e| e.name.as_str())
            .find(|canonical| ratio_ignore_case(name, canonical) > self.threshold)
    }

    /// Fold one attribute into the canonical set (value union).
    pub fn add<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.find_canonical(name).map(str::to_string) {
            Some(canonical) => {
                if canonical != name {
                    tracing::debug!(%name, %canonical, "Merging near-duplicate attribute");
                }
                self.canonical.extend(&canonical, values);
            }
            None => self.canonical.extend(name, values),
        }
    }

    /// Fold every attribute of `bucket`, in its insertion order.
    pub fn absorb(&mut self, bucket: &AttributeBucket) {
        for entry in bucket.iter() {
            self.add(&entry.name, &entry.values);
        }
    }

    pub fn finish(self) -> AttributeBucket {
        self.canonical
    }
}

/// Consolidate a sequence of buckets into one canonical bucket.
pub fn consolidate<'a, I>(buckets: I) -> AttributeBucket
where
    I: IntoIterator<Item = &'a AttributeBucket>,
{
    let mut consolidator = Consolidator::new();
    for bucket in buckets {
        consolidator.absorb(bucket);
    }
    consolidator.finish()
}
