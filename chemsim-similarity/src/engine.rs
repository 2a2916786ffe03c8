//! Similarity engine facade.
//!
//! [`SimilarityEngine`] owns one [`Calculator`] per [`SimilarityMetric`],
//! built once from an [`EngineConfig`] and read-only afterwards, and exposes
//! pair scoring, batch scoring, threshold search over molecules, multi-type
//! fused ranking, and exact re-ranking of candidates pulled from an external
//! approximate-nearest-neighbor index ([`CandidateSource`]).
//!
//! Errors from the calculators are returned unchanged. Batch operations stop
//! at the first failing candidate.

use std::collections::BTreeMap;

use chemsim_core::{ChemsimError, Result, Scored, Summarizable};
use tracing::{debug, trace};

use crate::calculator::{Calculator, DEFAULT_TVERSKY_ALPHA, DEFAULT_TVERSKY_BETA};
use crate::fingerprint::{Fingerprint, FingerprintType};
use crate::fusion::{FusionStrategy, TypeScores, TypeWeights};
use crate::metric::SimilarityMetric;
use crate::molecule::Molecule;

/// Default over-fetch factor when re-ranking index candidates.
pub const DEFAULT_RERANK_OVERSAMPLE: usize = 4;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Metric used by the `*_default` helpers.
    pub default_metric: SimilarityMetric,
    /// Tversky weight on features only in the query.
    pub tversky_alpha: f64,
    /// Tversky weight on features only in the candidate.
    pub tversky_beta: f64,
    /// Strategy used by [`SimilarityEngine::rank_fused`].
    pub fusion: FusionStrategy,
    /// Per-type weights for [`FusionStrategy::WeightedAverage`].
    pub fusion_weights: Option<TypeWeights>,
    /// How many candidates to request from an index per requested result.
    pub rerank_oversample: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_metric: SimilarityMetric::Tanimoto,
            tversky_alpha: DEFAULT_TVERSKY_ALPHA,
            tversky_beta: DEFAULT_TVERSKY_BETA,
            fusion: FusionStrategy::WeightedAverage,
            fusion_weights: None,
            rerank_oversample: DEFAULT_RERANK_OVERSAMPLE,
        }
    }
}

impl EngineConfig {
    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// - [`ChemsimError::NegativeParameter`] for a negative or non-finite
    ///   Tversky weight
    /// - [`ChemsimError::InvalidInput`] for a negative or non-finite fusion
    ///   weight, or a zero oversample factor
    pub fn validate(&self) -> Result<()> {
        Calculator::tversky(self.tversky_alpha, self.tversky_beta)?;
        if let Some(weights) = &self.fusion_weights {
            for (fp_type, &w) in weights {
                if !w.is_finite() || w < 0.0 {
                    return Err(ChemsimError::InvalidInput(format!(
                        "fusion weight for {} must be finite and non-negative, got {}",
                        fp_type, w
                    )));
                }
            }
        }
        if self.rerank_oversample == 0 {
            return Err(ChemsimError::InvalidInput(
                "rerank_oversample must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimilarityResult {
    pub candidate_id: String,
    pub score: f64,
    pub metric: SimilarityMetric,
    pub fingerprint_type: FingerprintType,
    /// 1-based position in a ranked result list.
    pub rank: Option<usize>,
}

impl Scored for SimilarityResult {
    fn score(&self) -> f64 {
        self.score
    }
}

impl Summarizable for SimilarityResult {
    fn summary(&self) -> String {
        let rank = self.rank.map(|r| format!("#{} ", r)).unwrap_or_default();
        format!(
            "{}{}: {} {} = {:.4}",
            rank, self.candidate_id, self.fingerprint_type, self.metric, self.score
        )
    }
}

/// One candidate scored across several fingerprint types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusedResult {
    pub candidate_id: String,
    /// Fused score.
    pub score: f64,
    pub metric: SimilarityMetric,
    pub strategy: FusionStrategy,
    /// The per-type scores that were fused.
    pub type_scores: TypeScores,
    /// 1-based position in a ranked result list.
    pub rank: Option<usize>,
}

impl Scored for FusedResult {
    fn score(&self) -> f64 {
        self.score
    }
}

impl Summarizable for FusedResult {
    fn summary(&self) -> String {
        let rank = self.rank.map(|r| format!("#{} ", r)).unwrap_or_default();
        format!(
            "{}{}: {} {} over {} types = {:.4}",
            rank,
            self.candidate_id,
            self.strategy,
            self.metric,
            self.type_scores.len(),
            self.score
        )
    }
}

/// A candidate returned by an external index.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub fingerprint: Fingerprint,
}

/// Source of approximate nearest neighbors, typically an ANN index.
///
/// The engine only relies on the source to return plausible candidates;
/// ordering and scores come from exact re-scoring.
pub trait CandidateSource {
    /// Up to `limit` candidates likely to be similar to `query`.
    fn candidates(&self, query: &Fingerprint, limit: usize) -> Result<Vec<Candidate>>;
}

/// Facade over the similarity calculators.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: EngineConfig,
    calculators: BTreeMap<SimilarityMetric, Calculator>,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEngine {
    /// Engine with the default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Engine with a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let calculators = SimilarityMetric::ALL
            .into_iter()
            .map(|metric| {
                let calculator = match metric {
                    SimilarityMetric::Tversky => Calculator::Tversky {
                        alpha: config.tversky_alpha,
                        beta: config.tversky_beta,
                    },
                    other => Calculator::for_metric(other),
                };
                (metric, calculator)
            })
            .collect();
        Self {
            config,
            calculators,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The calculator registered for `metric`.
    pub fn calculator(&self, metric: SimilarityMetric) -> Result<Calculator> {
        self.calculators
            .get(&metric)
            .copied()
            .ok_or_else(|| ChemsimError::UnsupportedMetric(metric.to_string()))
    }

    /// The calculator registered under `name` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::UnsupportedMetric`] for an unknown name.
    pub fn calculator_by_name(&self, name: &str) -> Result<Calculator> {
        self.calculator(name.parse()?)
    }

    /// Score one pair.
    pub fn score(
        &self,
        query: &Fingerprint,
        candidate: &Fingerprint,
        metric: SimilarityMetric,
    ) -> Result<f64> {
        self.calculator(metric)?.calculate(query, candidate)
    }

    /// Score one pair with a metric given by name.
    pub fn score_by_name(
        &self,
        query: &Fingerprint,
        candidate: &Fingerprint,
        metric: &str,
    ) -> Result<f64> {
        self.calculator_by_name(metric)?.calculate(query, candidate)
    }

    /// Score one pair with the configured default metric.
    pub fn score_default(&self, query: &Fingerprint, candidate: &Fingerprint) -> Result<f64> {
        self.score(query, candidate, self.config.default_metric)
    }

    /// Score `query` against each candidate in order.
    ///
    /// The first failing candidate aborts the batch with its error.
    pub fn batch_score<'a, I>(
        &self,
        query: &Fingerprint,
        candidates: I,
        metric: SimilarityMetric,
    ) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = &'a Fingerprint>,
    {
        let calculator = self.calculator(metric)?;
        let scores = candidates
            .into_iter()
            .map(|candidate| calculator.calculate(query, candidate))
            .collect::<Result<Vec<_>>>()?;
        debug!(%metric, candidates = scores.len(), "batch scored");
        Ok(scores)
    }

    /// Parallel [`SimilarityEngine::batch_score`].
    ///
    /// Fails if any candidate fails; which error is reported when several
    /// candidates fail is unspecified.
    #[cfg(feature = "parallel")]
    pub fn batch_score_par(
        &self,
        query: &Fingerprint,
        candidates: &[Fingerprint],
        metric: SimilarityMetric,
    ) -> Result<Vec<f64>> {
        use rayon::prelude::*;

        let calculator = self.calculator(metric)?;
        let scores = candidates
            .par_iter()
            .map(|candidate| calculator.calculate(query, candidate))
            .collect::<Result<Vec<_>>>()?;
        debug!(%metric, candidates = scores.len(), "parallel batch scored");
        Ok(scores)
    }

    /// Compare the `fp_type` fingerprints of two molecules.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::NilFingerprint`] if either molecule has no
    /// fingerprint of `fp_type`.
    pub fn compare_molecules(
        &self,
        query: &Molecule,
        candidate: &Molecule,
        fp_type: FingerprintType,
        metric: SimilarityMetric,
    ) -> Result<f64> {
        let calculator = self.calculator(metric)?;
        let lhs = query.fingerprint(fp_type).ok_or_else(|| missing(query, fp_type))?;
        let rhs = candidate
            .fingerprint(fp_type)
            .ok_or_else(|| missing(candidate, fp_type))?;
        calculator.calculate(lhs, rhs)
    }

    /// Rank searchable candidates by similarity to `query`.
    ///
    /// Candidates that are not active, or that have no fingerprint of the
    /// query's type, are skipped. Scores below `threshold` are dropped. The
    /// rest are sorted by descending score (ties by candidate id), truncated
    /// to `limit`, and ranked from 1.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::InvalidInput`] if `threshold` is not within
    /// `[0, 1]`, or the first calculator error.
    pub fn search(
        &self,
        query: &Fingerprint,
        candidates: &[Molecule],
        metric: SimilarityMetric,
        threshold: f64,
        limit: Option<usize>,
    ) -> Result<Vec<SimilarityResult>> {
        check_threshold(threshold)?;
        let calculator = self.calculator(metric)?;
        let fp_type = query.fingerprint_type();
        let mut results = Vec::new();
        for molecule in candidates {
            if !molecule.is_searchable() {
                trace!(
                    id = molecule.id(),
                    status = %molecule.status(),
                    "skipping inactive candidate"
                );
                continue;
            }
            let Some(fingerprint) = molecule.fingerprint(fp_type) else {
                trace!(id = molecule.id(), %fp_type, "skipping candidate without fingerprint");
                continue;
            };
            let score = calculator.calculate(query, fingerprint)?;
            if score < threshold {
                continue;
            }
            results.push(SimilarityResult {
                candidate_id: molecule.id().to_string(),
                score,
                metric,
                fingerprint_type: fp_type,
                rank: None,
            });
        }
        let results = rank_results(results, limit);
        debug!(
            %metric,
            %fp_type,
            candidates = candidates.len(),
            hits = results.len(),
            "similarity search complete"
        );
        Ok(results)
    }

    /// Rank candidates by fusing scores across `types` with the configured
    /// strategy and weights.
    pub fn rank_fused(
        &self,
        query: &Molecule,
        candidates: &[Molecule],
        metric: SimilarityMetric,
        types: &[FingerprintType],
    ) -> Result<Vec<FusedResult>> {
        self.rank_fused_with(
            query,
            candidates,
            metric,
            types,
            self.config.fusion,
            self.config.fusion_weights.as_ref(),
        )
    }

    /// Rank candidates by fusing scores across `types`.
    ///
    /// For every searchable candidate, each requested type present on both
    /// the query and the candidate is scored; the per-type scores are fused
    /// with `strategy`. Candidates sharing none of the requested types are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::InvalidInput`] if `types` is empty, or the first
    /// calculator error.
    pub fn rank_fused_with(
        &self,
        query: &Molecule,
        candidates: &[Molecule],
        metric: SimilarityMetric,
        types: &[FingerprintType],
        strategy: FusionStrategy,
        weights: Option<&TypeWeights>,
    ) -> Result<Vec<FusedResult>> {
        if types.is_empty() {
            return Err(ChemsimError::InvalidInput(
                "fused ranking needs at least one fingerprint type".into(),
            ));
        }
        let calculator = self.calculator(metric)?;
        let mut results = Vec::new();
        for molecule in candidates.iter().filter(|m| m.is_searchable()) {
            let mut type_scores = TypeScores::new();
            for &fp_type in types {
                if let (Some(lhs), Some(rhs)) =
                    (query.fingerprint(fp_type), molecule.fingerprint(fp_type))
                {
                    type_scores.insert(fp_type, calculator.calculate(lhs, rhs)?);
                }
            }
            if type_scores.is_empty() {
                trace!(id = molecule.id(), "skipping candidate with no shared fingerprint types");
                continue;
            }
            let score = strategy.fuse(&type_scores, weights)?;
            results.push(FusedResult {
                candidate_id: molecule.id().to_string(),
                score,
                metric,
                strategy,
                type_scores,
                rank: None,
            });
        }
        sort_by_score(&mut results, |r| (r.score, r.candidate_id.as_str()));
        for (i, result) in results.iter_mut().enumerate() {
            result.rank = Some(i + 1);
        }
        debug!(
            %metric,
            %strategy,
            candidates = candidates.len(),
            hits = results.len(),
            "fused ranking complete"
        );
        Ok(results)
    }

    /// Top `k` results for `query` from an external index, re-scored exactly.
    ///
    /// Requests `k * rerank_oversample` candidates from `source`. Candidates of
    /// another fingerprint type than the query are dropped.
    pub fn search_index(
        &self,
        source: &dyn CandidateSource,
        query: &Fingerprint,
        metric: SimilarityMetric,
        k: usize,
    ) -> Result<Vec<SimilarityResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let calculator = self.calculator(metric)?;
        let fetch = k.saturating_mul(self.config.rerank_oversample);
        let candidates = source.candidates(query, fetch)?;
        let fetched = candidates.len();
        let mut results = Vec::with_capacity(fetched);
        for candidate in candidates {
            if candidate.fingerprint.fingerprint_type() != query.fingerprint_type() {
                trace!(id = %candidate.id, "dropping index candidate of another type");
                continue;
            }
            let score = calculator.calculate(query, &candidate.fingerprint)?;
            results.push(SimilarityResult {
                candidate_id: candidate.id,
                score,
                metric,
                fingerprint_type: query.fingerprint_type(),
                rank: None,
            });
        }
        let results = rank_results(results, Some(k));
        debug!(%metric, requested = fetch, fetched, hits = results.len(), "index re-rank complete");
        Ok(results)
    }
}

fn missing(molecule: &Molecule, fp_type: FingerprintType) -> ChemsimError {
    ChemsimError::NilFingerprint(format!("{} has no {} fingerprint", molecule.id(), fp_type))
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ChemsimError::InvalidInput(format!(
            "threshold must be within [0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

fn rank_results(mut results: Vec<SimilarityResult>, limit: Option<usize>) -> Vec<SimilarityResult> {
    sort_by_score(&mut results, |r| (r.score, r.candidate_id.as_str()));
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = Some(i + 1);
    }
    results
}

/// Descending score, ascending id on ties.
fn sort_by_score<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (f64, &str),
{
    items.sort_by(|a, b| {
        let (score_a, id_a) = key(a);
        let (score_b, id_b) = key(b);
        score_b
            .total_cmp(&score_a)
            .then_with(|| id_a.cmp(id_b))
    });
}
