//! Semantic duplicate scanning.
//!
//! Scores every unordered pair of requirement texts with a pluggable
//! [`Similarity`] scorer and reports the pairs falling inside a score
//! window, together with a decile histogram of all scores. The scorer is a
//! black box to this module; [`TokenOverlap`] is the built-in lexical
//! stand-in.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::domain::{Code, RequirementIndex};

/// Black-box similarity scoring over two requirement texts.
///
/// Scores must fall in `[0, 1]`, where 1 means identical meaning.
pub trait Similarity {
    /// Scores the similarity of two texts.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Lexical token-overlap scorer: Jaccard similarity over lower-cased word
/// sets.
///
/// A deliberately simple stand-in for a real semantic scorer; it satisfies
/// the [`Similarity`] contract without any language resources.
#[derive(Debug, Clone)]
pub struct TokenOverlap {
    word: Regex,
}

impl TokenOverlap {
    /// Creates the scorer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            word: Regex::new(r"[A-Za-z0-9']+").expect("the token pattern must compile"),
        }
    }

    fn tokens(&self, text: &str) -> BTreeSet<String> {
        self.word
            .find_iter(text)
            .map(|token| token.as_str().to_lowercase())
            .collect()
    }
}

impl Default for TokenOverlap {
    fn default() -> Self {
        Self::new()
    }
}

impl Similarity for TokenOverlap {
    fn score(&self, a: &str, b: &str) -> f64 {
        let first = self.tokens(a);
        let second = self.tokens(b);
        let union = first.union(&second).count();
        if union == 0 {
            return 0.0;
        }

        let shared = first.intersection(&second).count();
        #[allow(clippy::cast_precision_loss)]
        let score = shared as f64 / union as f64;
        score
    }
}

/// One requirement pair whose score fell inside the configured window.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    /// Code of the first requirement of the pair (in code order).
    pub first: Code,
    /// Code of the second requirement of the pair.
    pub second: Code,
    /// The similarity score.
    pub score: f64,
}

/// The result of a full pairwise scan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemanticReport {
    /// Pairs inside the score window, in scan order.
    pub matches: Vec<SimilarityMatch>,
    /// Histogram of all pair scores by decile: key `d` counts scores in
    /// `[d/10, (d+1)/10)`, with 10 counting exact 1.0 scores.
    pub ranges: BTreeMap<u8, usize>,
}

/// Scores all requirement pairs against a similarity window.
#[derive(Debug)]
pub struct SemanticChecker<'a, S> {
    index: &'a RequirementIndex,
    scorer: S,
    min_score: f64,
    max_score: f64,
}

impl<'a, S: Similarity> SemanticChecker<'a, S> {
    /// Creates a checker reporting scores in `[min_score, max_score]`.
    #[must_use]
    pub const fn new(
        index: &'a RequirementIndex,
        scorer: S,
        min_score: f64,
        max_score: f64,
    ) -> Self {
        Self {
            index,
            scorer,
            min_score,
            max_score,
        }
    }

    /// Runs the scan.
    #[must_use]
    pub fn check(&self) -> SemanticReport {
        self.check_with(|_| {})
    }

    /// Runs the scan, reporting progress after each outer requirement.
    ///
    /// Every unordered pair is scored exactly once; the histogram and the
    /// match list are fed from the same single score.
    pub fn check_with(&self, mut progress: impl FnMut(usize)) -> SemanticReport {
        let requirements: Vec<_> = self.index.iter().collect();
        let mut report = SemanticReport::default();

        for (position, first) in requirements.iter().enumerate() {
            for second in &requirements[position + 1..] {
                let score = self
                    .scorer
                    .score(first.full_text(), second.full_text());

                *report.ranges.entry(decile(score)).or_insert(0) += 1;

                if score >= self.min_score && score <= self.max_score {
                    report.matches.push(SimilarityMatch {
                        first: first.code().clone(),
                        second: second.code().clone(),
                        score,
                    });
                }
            }
            progress(position + 1);
        }

        report
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decile(score: f64) -> u8 {
    let clamped = score.clamp(0.0, 1.0);
    (clamped * 10.0).floor() as u8
}
