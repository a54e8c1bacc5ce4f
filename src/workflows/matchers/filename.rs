use log::debug;

use super::metric::AttributeMatchMetric;
use crate::domain::error::GrabError;
use crate::domain::ports::AttributeParser;

/// Matches file names by their parsed release attributes.
pub struct FilenameMatcher<P> {
    parser: P,
    metric: AttributeMatchMetric,
}

impl<P: AttributeParser> FilenameMatcher<P> {
    pub fn new(parser: P) -> Self {
        Self::with_metric(parser, AttributeMatchMetric::default())
    }

    pub fn with_metric(parser: P, metric: AttributeMatchMetric) -> Self {
        Self { parser, metric }
    }

    /// `scores[i]` is the similarity of `reference` and `candidates[i]`.
    pub fn match_scores<S: AsRef<str>>(&self, reference: &str, candidates: &[S]) -> Vec<f64> {
        let reference = self.parser.parse(reference);
        candidates
            .iter()
            .map(|name| self.metric.score(&reference, &self.parser.parse(name.as_ref())))
            .collect()
    }

    /// Index of the best scoring candidate, or `None` if even the best one is
    /// below the metric threshold. Ties go to the lowest index.
    pub fn best_match_index<S: AsRef<str>>(
        &self,
        reference: &str,
        candidates: &[S],
    ) -> Result<Option<usize>, GrabError> {
        if candidates.is_empty() {
            return Err(GrabError::EmptyCandidateSet);
        }

        let scores = self.match_scores(reference, candidates);
        debug!(
            "Match scores for {reference} (out of {}): {scores:?}",
            self.metric.weights().total()
        );

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }

        if scores[best] < self.metric.threshold() {
            return Ok(None);
        }
        Ok(Some(best))
    }
}
