//! Percentage breakdowns over a closed label set

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A closed, ordered label set (emotion taxonomies)
///
/// Declaration order doubles as the tie-break order: when two labels
/// score identically the one listed first in `ALL` wins.
pub trait Label: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Every label, in declaration order
    const ALL: &'static [Self];

    /// Lowercase label name
    fn as_str(&self) -> &'static str;
}

/// Label → percentage distribution summing to 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "L: Serialize",
    deserialize = "L: Deserialize<'de>"
))]
pub struct Breakdown<L: Label> {
    shares: BTreeMap<L, f64>,
}

impl<L: Label> Breakdown<L> {
    /// Build a breakdown from non-negative scores, normalizing to 100
    ///
    /// Negative or non-finite scores count as zero. If nothing scores, the
    /// mass is split evenly across the supplied labels (or across every
    /// label when none were supplied).
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (L, f64)>,
    {
        let mut raw: BTreeMap<L, f64> = BTreeMap::new();
        for (label, score) in scores {
            let score = if score.is_finite() { score.max(0.0) } else { 0.0 };
            *raw.entry(label).or_insert(0.0) += score;
        }
        if raw.is_empty() {
            raw = L::ALL.iter().map(|l| (*l, 0.0)).collect();
        }

        let total: f64 = raw.values().sum();
        let shares = if total > 0.0 {
            raw.into_iter()
                .map(|(l, v)| (l, v / total * 100.0))
                .collect()
        } else {
            let even = 100.0 / raw.len() as f64;
            raw.into_keys().map(|l| (l, even)).collect()
        };
        Self { shares }
    }

    /// Percentage for a label (0 when absent)
    pub fn get(&self, label: L) -> f64 {
        self.shares.get(&label).copied().unwrap_or(0.0)
    }

    /// Sum of all shares (100 up to rounding)
    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Iterate over (label, percentage) in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (L, f64)> + '_ {
        self.shares.iter().map(|(l, v)| (*l, *v))
    }

    /// Labels ranked by share, highest first; ties keep declaration order
    pub fn ranked(&self) -> Vec<(L, f64)> {
        let mut ranked: Vec<(L, f64)> = self.iter().collect();
        ranked.sort_by_key(|(_, v)| std::cmp::Reverse(OrderedFloat(*v)));
        ranked
    }

    /// Winning label and its share
    pub fn top(&self) -> (L, f64) {
        let mut best: Option<(L, f64)> = None;
        for (label, share) in self.iter() {
            match best {
                Some((_, b)) if share <= b => {}
                _ => best = Some((label, share)),
            }
        }
        best.unwrap_or((L::ALL[0], 0.0))
    }

    /// Share of the runner-up label (0 when only one label is present)
    pub fn second_share(&self) -> f64 {
        self.ranked().get(1).map(|(_, v)| *v).unwrap_or(0.0)
    }

    /// Exponential moving average toward `next`, renormalized to 100
    ///
    /// `alpha` is the weight of the new sample.
    pub fn blend(&self, next: &Breakdown<L>, alpha: f64) -> Breakdown<L> {
        let alpha = alpha.clamp(0.0, 1.0);
        let labels: Vec<L> = self
            .shares
            .keys()
            .chain(next.shares.keys())
            .copied()
            .collect();
        Breakdown::from_scores(labels.into_iter().map(|l| {
            let prev = self.get(l);
            let curr = next.get(l);
            (l, alpha * curr + (1.0 - alpha) * prev)
        }))
    }

    /// Re-key through a label mapping, summing labels that collide
    pub fn map_labels<M: Label>(&self, f: impl Fn(L) -> M) -> Breakdown<M> {
        Breakdown::from_scores(self.iter().map(|(l, v)| (f(l), v)))
    }
}
