//! Forecast slug resolver.
//!
//! Each slug directory moves through
//! `Discovered -> ReadyForAnalysis -> ReadyForMatching -> Processed`,
//! judged purely from the files on disk. The scan walks slugs newest-first
//! and stops at the first processed one; everything older is taken as
//! handled, which holds as long as markers are written in chronological
//! order.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use rainbow_analysis::{write_atomic, SlugArtifacts};
use rainbow_common::ForecastSlug;
use serde::Serialize;
use tracing::{debug, warn};

use crate::PipelineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugState {
    /// Directory exists but the raw raster has not arrived
    Discovered,
    ReadyForAnalysis,
    /// Final mask written, cities not matched yet
    ReadyForMatching,
    Processed,
}

impl fmt::Display for SlugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Discovered => "discovered",
            Self::ReadyForAnalysis => "ready_for_analysis",
            Self::ReadyForMatching => "ready_for_matching",
            Self::Processed => "processed",
        };
        f.write_str(s)
    }
}

pub fn slug_state(data_dir: &Path, slug: ForecastSlug) -> SlugState {
    let artifacts = SlugArtifacts::new(data_dir, slug);
    if artifacts.processed_marker().exists() {
        SlugState::Processed
    } else if artifacts.final_mask().exists() {
        SlugState::ReadyForMatching
    } else if artifacts.raw_grib().exists() {
        SlugState::ReadyForAnalysis
    } else {
        SlugState::Discovered
    }
}

/// Slug directories under `data_dir`, newest first.
pub fn list_slugs(data_dir: &Path) -> PipelineResult<Vec<ForecastSlug>> {
    if !data_dir.exists() {
        warn!(path = %data_dir.display(), "Forecast data directory not found");
        return Ok(Vec::new());
    }

    let mut slugs = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if let Some(slug) = name.to_str().and_then(|s| ForecastSlug::parse(s).ok()) {
            slugs.push(slug);
        }
    }

    slugs.sort_unstable_by(|a, b| b.cmp(a));
    Ok(slugs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub slug: ForecastSlug,
    pub state: SlugState,
}

/// Unprocessed slugs to handle this run, oldest first.
///
/// Collection stops at the first processed slug or after `max_backlog`
/// candidates. Slugs still waiting for their raw raster are skipped.
pub fn resolve_candidates(data_dir: &Path, max_backlog: usize) -> PipelineResult<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for slug in list_slugs(data_dir)? {
        match slug_state(data_dir, slug) {
            SlugState::Processed => {
                debug!(slug = %slug, "Reached processed forecast, stopping scan");
                break;
            }
            SlugState::Discovered => {
                warn!(slug = %slug, "Forecast has no raw raster yet, skipping");
            }
            state => {
                candidates.push(Candidate { slug, state });
                if candidates.len() >= max_backlog {
                    debug!(max_backlog = max_backlog, "Backlog limit reached");
                    break;
                }
            }
        }
    }

    candidates.reverse();
    Ok(candidates)
}

/// Write the processing marker for `slug`.
pub fn mark_processed(data_dir: &Path, slug: ForecastSlug) -> PipelineResult<()> {
    let marker = SlugArtifacts::new(data_dir, slug).processed_marker();
    write_atomic(&marker, b"")?;
    debug!(slug = %slug, path = %marker.display(), "Wrote processing marker");
    Ok(())
}

/// One row of the forecast listing.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastInfo {
    pub slug: ForecastSlug,
    pub date: DateTime<Utc>,
    pub future: bool,
    pub state: SlugState,
}

/// Forecasts newest-first, ending with the first one not in the future.
pub fn forecast_listing(data_dir: &Path, now: DateTime<Utc>) -> PipelineResult<Vec<ForecastInfo>> {
    let mut listing = Vec::new();
    for slug in list_slugs(data_dir)? {
        let future = slug.is_future(now);
        listing.push(ForecastInfo {
            slug,
            date: slug.datetime(),
            future,
            state: slug_state(data_dir, slug),
        });
        if !future {
            break;
        }
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_utils::ForecastTree;

    fn slug(s: &str) -> ForecastSlug {
        ForecastSlug::parse(s).unwrap()
    }

    #[test]
    fn test_states_follow_files() {
        let tree = ForecastTree::new();
        let s = "2016092812";
        tree.slug_dir(s);
        assert_eq!(slug_state(tree.root(), slug(s)), SlugState::Discovered);

        tree.add_raw_grib(s);
        assert_eq!(slug_state(tree.root(), slug(s)), SlugState::ReadyForAnalysis);

        std::fs::write(tree.final_mask_path(s), b"png").unwrap();
        assert_eq!(slug_state(tree.root(), slug(s)), SlugState::ReadyForMatching);

        mark_processed(tree.root(), slug(s)).unwrap();
        assert_eq!(slug_state(tree.root(), slug(s)), SlugState::Processed);
        assert!(tree.has_marker(s));
    }

    #[test]
    fn test_list_ignores_other_entries() {
        let tree = ForecastTree::new();
        tree.slug_dir("2016092806");
        tree.slug_dir("2016092812");
        tree.slug_dir("latest");
        tree.slug_dir("20160928");
        std::fs::write(tree.root().join("2016092818"), b"file").unwrap();

        let slugs = list_slugs(tree.root()).unwrap();
        assert_eq!(slugs, vec![slug("2016092812"), slug("2016092806")]);
    }

    #[test]
    fn test_missing_data_dir_is_empty() {
        let tree = ForecastTree::new();
        assert!(list_slugs(&tree.root().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_scan_stops_at_processed() {
        let tree = ForecastTree::new();
        tree.add_raw_grib("2016092806");
        tree.add_raw_grib("2016092809");
        tree.add_marker("2016092809");
        tree.add_raw_grib("2016092812");
        tree.add_raw_grib("2016092815");

        let candidates = resolve_candidates(tree.root(), 8).unwrap();
        let slugs: Vec<_> = candidates.iter().map(|c| c.slug).collect();
        assert_eq!(slugs, vec![slug("2016092812"), slug("2016092815")]);
        assert!(candidates
            .iter()
            .all(|c| c.state == SlugState::ReadyForAnalysis));
    }

    #[test]
    fn test_scan_skips_downloading_slug() {
        let tree = ForecastTree::new();
        tree.add_raw_grib("2016092812");
        tree.slug_dir("2016092815");

        let candidates = resolve_candidates(tree.root(), 8).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].slug, slug("2016092812"));
    }

    #[test]
    fn test_backlog_keeps_newest() {
        let tree = ForecastTree::new();
        for s in ["2016092806", "2016092809", "2016092812", "2016092815"] {
            tree.add_raw_grib(s);
        }

        let slugs: Vec<_> = resolve_candidates(tree.root(), 2)
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec![slug("2016092812"), slug("2016092815")]);
    }

    #[test]
    fn test_forecast_listing_stops_at_present() {
        let tree = ForecastTree::new();
        for s in ["2016092806", "2016092809", "2016092812", "2016092815"] {
            tree.add_raw_grib(s);
        }
        let now = Utc.with_ymd_and_hms(2016, 9, 28, 10, 0, 0).unwrap();

        let listing = forecast_listing(tree.root(), now).unwrap();
        let rows: Vec<_> = listing
            .iter()
            .map(|f| (f.slug.to_string(), f.future))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("2016092815".to_string(), true),
                ("2016092812".to_string(), true),
                ("2016092809".to_string(), false),
            ]
        );
    }
}
