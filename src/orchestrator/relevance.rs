use crate::retrieval::RetrievedDocument;

/// Decides which retrieved documents are relevant enough to ground an answer.
///
/// Without a threshold every returned match is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelevancePolicy {
    min_score: Option<f32>,
}

impl RelevancePolicy {
    pub fn accept_all() -> Self {
        Self { min_score: None }
    }

    pub fn with_min_score(min_score: f32) -> Self {
        Self {
            min_score: Some(min_score),
        }
    }

    pub fn min_score(&self) -> Option<f32> {
        self.min_score
    }

    /// Keeps documents at or above the threshold, preserving order.
    pub fn select(&self, docs: Vec<RetrievedDocument>) -> Vec<RetrievedDocument> {
        match self.min_score {
            None => docs,
            Some(min) => docs.into_iter().filter(|d| d.score >= min).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f32) -> RetrievedDocument {
        RetrievedDocument::new(format!("doc {}", score), Some(1), score)
    }

    #[test]
    fn accept_all_keeps_everything() {
        let docs = vec![scored(0.9), scored(0.01)];
        assert_eq!(RelevancePolicy::accept_all().select(docs.clone()), docs);
        assert_eq!(RelevancePolicy::default(), RelevancePolicy::accept_all());
    }

    #[test]
    fn threshold_filters_and_keeps_order() {
        let policy = RelevancePolicy::with_min_score(0.5);
        let kept = policy.select(vec![scored(0.9), scored(0.2), scored(0.5)]);
        let scores: Vec<f32> = kept.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }
}
