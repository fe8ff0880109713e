//! Deterministic candidate ranking.
//!
//! Score = format weight + recency bonus - legacy penalty, sorted descending
//! with extraction order as the tie-break. No I/O. Format precedence
//! (xlsx > csv > xls > zip > other) cannot be overturned by the other two
//! signals because `RankingConfig::validate` keeps their sum below the
//! smallest gap between format weights.

pub mod signals;

use crate::asset::{AssetFormat, Candidate, RankedAsset};
use crate::config::{ConfigError, RankingConfig};

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: RankingConfig,
}

impl Ranker {
    pub fn new(config: RankingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Score one candidate given the newest year token on the page.
    pub fn score(&self, candidate: &Candidate, newest_year: Option<u16>) -> i64 {
        let format = AssetFormat::from_extension(&candidate.format_hint);
        let mut score = self.config.weight_for(format);
        if let Some(newest) = newest_year {
            let recent = signals::year_tokens(&candidate.url)
                .chain(signals::year_tokens(&candidate.title))
                .any(|y| y == newest);
            if recent {
                score = score.saturating_add(self.config.recency_bonus);
            }
        }
        if signals::is_legacy(&candidate.url) {
            score = score.saturating_sub(self.config.legacy_penalty);
        }
        score
    }

    /// Ranks candidates; `rank` is the 1-based position in the result.
    pub fn rank(&self, candidates: &[Candidate]) -> Vec<RankedAsset> {
        let newest_year = signals::newest_year(
            candidates
                .iter()
                .flat_map(|c| [c.url.as_str(), c.title.as_str()]),
        );

        let mut scored: Vec<(usize, i64)> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.score(c, newest_year)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        scored
            .into_iter()
            .enumerate()
            .map(|(pos, (i, score))| {
                let candidate = &candidates[i];
                let format = AssetFormat::from_extension(&candidate.format_hint);
                RankedAsset::from_candidate(candidate, format, score, pos + 1)
            })
            .collect()
    }
}

/// Ranks with the default weights.
pub fn rank(candidates: &[Candidate]) -> Vec<RankedAsset> {
    Ranker::default().rank(candidates)
}
