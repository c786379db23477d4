//! One pipeline run over the forecast tree.

use std::path::Path;

use gazetteer::Gazetteer;
use rainbow_analysis::{
    analyze_slug, load_final_mask, AnalysisOptions, AnalysisReport, SlugArtifacts, Toolset,
};
use rainbow_common::ForecastSlug;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::lock::RunLock;
use crate::matcher::CityMatcher;
use crate::notifier::{NotifyReport, Notifier};
use crate::resolver::{mark_processed, resolve_candidates, Candidate, SlugState};
use crate::results::write_results;
use crate::PipelineResult;

#[derive(Debug, Clone, Serialize)]
pub struct SlugOutcome {
    pub slug: ForecastSlug,
    pub cities: usize,
    pub notifications: NotifyReport,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub processed: Vec<SlugOutcome>,
    /// Slugs that turned out not to be ready; retried next run
    pub skipped: Vec<ForecastSlug>,
}

pub struct Pipeline {
    config: PipelineConfig,
    tools: Toolset,
    gazetteer: Gazetteer,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        tools: Toolset,
        gazetteer: Gazetteer,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            tools,
            gazetteer,
            notifier,
        }
    }

    /// Process every pending forecast, oldest first.
    ///
    /// A fatal error stops the run; the failing slug and everything newer
    /// stay unmarked and are picked up again next time. Markers are only
    /// ever written in order, so a slug that keeps failing blocks every
    /// newer forecast until it is fixed or marked by hand. The blocked slugs
    /// are logged with the error.
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let _lock = RunLock::acquire(&self.config.data_dir)?;

        let candidates = resolve_candidates(&self.config.data_dir, self.config.max_backlog)?;
        if candidates.is_empty() {
            info!("No unprocessed forecasts");
            return Ok(RunReport::default());
        }
        info!(count = candidates.len(), "Found unprocessed forecasts");

        let mut report = RunReport::default();
        for (index, &candidate) in candidates.iter().enumerate() {
            match self.process(candidate).await {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) if e.is_not_ready() => {
                    warn!(slug = %candidate.slug, error = %e, "Forecast not ready");
                    report.skipped.push(candidate.slug);
                }
                Err(e) => {
                    error!(slug = %candidate.slug, error = %e, "Forecast processing failed");
                    let blocked: Vec<String> = candidates[index + 1..]
                        .iter()
                        .map(|c| c.slug.to_string())
                        .collect();
                    if !blocked.is_empty() {
                        warn!(
                            slug = %candidate.slug,
                            blocked = ?blocked,
                            "Newer forecasts left pending behind failed slug"
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    async fn process(&self, candidate: Candidate) -> PipelineResult<SlugOutcome> {
        let slug = candidate.slug;
        let data_dir = &self.config.data_dir;

        if candidate.state == SlugState::ReadyForAnalysis {
            analyze_blocking(data_dir, slug, &self.tools, &self.analysis_options()).await?;
        }

        let mask = load_final_mask(&SlugArtifacts::new(data_dir, slug).final_mask())?;
        let cities = CityMatcher::new(&self.gazetteer).match_mask(&mask).await?;
        write_results(data_dir, &self.config.latest_dir, slug, &cities)?;

        let notifications = self.notifier.notify(&cities).await;
        mark_processed(data_dir, slug)?;

        info!(
            slug = %slug,
            cities = cities.len(),
            sent = notifications.sent,
            failed = notifications.failed,
            "Forecast processed"
        );
        Ok(SlugOutcome {
            slug,
            cities: cities.len(),
            notifications,
        })
    }

    fn analysis_options(&self) -> AnalysisOptions {
        analysis_options(&self.config)
    }
}

fn analysis_options(config: &PipelineConfig) -> AnalysisOptions {
    AnalysisOptions {
        solar_column_offset: config.solar_column_offset,
        ..Default::default()
    }
}

/// Run the CPU-bound analysis off the async runtime.
async fn analyze_blocking(
    data_dir: &Path,
    slug: ForecastSlug,
    tools: &Toolset,
    options: &AnalysisOptions,
) -> PipelineResult<AnalysisReport> {
    let data_dir = data_dir.to_path_buf();
    let tools = tools.clone();
    let options = options.clone();

    let report =
        tokio::task::spawn_blocking(move || analyze_slug(&data_dir, slug, &tools, &options))
            .await??;
    Ok(report)
}

/// Regenerate analysis artifacts for explicit slugs.
///
/// Never matches, notifies or writes markers.
pub async fn analyze_only(
    config: &PipelineConfig,
    tools: &Toolset,
    slugs: &[ForecastSlug],
) -> PipelineResult<Vec<AnalysisReport>> {
    let _lock = RunLock::acquire(&config.data_dir)?;
    let options = analysis_options(config);

    let mut reports = Vec::with_capacity(slugs.len());
    for &slug in slugs {
        match analyze_blocking(&config.data_dir, slug, tools, &options).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(slug = %slug, error = %e, "Analysis failed");
                return Err(e);
            }
        }
    }
    Ok(reports)
}
