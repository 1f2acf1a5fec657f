// Copyright @yucwang 2026

use super::constants::Float;

/// Discrete distribution over a list of non-negative weights. Weights
/// are appended one by one and turned into a normalized CDF by
/// `normalize`; sampling is invalid before that.
#[derive(Debug, Clone)]
pub struct DiscretePdf {
    cdf: Vec<Float>,
    normalization: Float,
    normalized: bool,
}

impl DiscretePdf {
    pub fn new() -> Self {
        Self { cdf: vec![0.0], normalization: 0.0, normalized: false }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut cdf = Vec::with_capacity(capacity + 1);
        cdf.push(0.0);
        Self { cdf, normalization: 0.0, normalized: false }
    }

    pub fn append(&mut self, weight: Float) {
        let last = *self.cdf.last().unwrap_or(&0.0);
        self.cdf.push(last + weight.max(0.0));
        self.normalized = false;
    }

    pub fn len(&self) -> usize {
        self.cdf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all appended weights.
    pub fn normalization(&self) -> Float {
        self.normalization
    }

    /// Turn the accumulated weights into a CDF. Returns the sum of
    /// weights so callers can keep e.g. the total surface area around.
    pub fn normalize(&mut self) -> Float {
        self.normalization = *self.cdf.last().unwrap_or(&0.0);
        if self.normalization > 0.0 {
            let inv = 1.0 / self.normalization;
            for value in self.cdf.iter_mut() {
                *value *= inv;
            }
            *self.cdf.last_mut().unwrap() = 1.0;
        }
        self.normalized = true;
        self.normalization
    }

    pub fn pdf(&self, index: usize) -> Float {
        self.cdf[index + 1] - self.cdf[index]
    }

    /// Sample an entry and rescale `u` to a fresh uniform sample, so the
    /// caller can reuse it for a follow-up continuous decision.
    pub fn sample_reuse(&self, u: &mut Float) -> (usize, Float) {
        debug_assert!(self.normalized, "DiscretePdf must be normalized before sampling");
        let entry = self
            .cdf
            .partition_point(|&c| c <= *u)
            .clamp(1, self.cdf.len() - 1);
        let index = entry - 1;
        let pdf = self.pdf(index);
        if pdf > 0.0 {
            *u = (*u - self.cdf[index]) / pdf;
        }
        (index, pdf)
    }
}
