//! Rainbow forecast pipeline.
//!
//! Finds forecasts that have not been handled yet, turns each into a
//! rainbow mask, matches the mask against the gazetteer, publishes the
//! matched cities and sends notifications. A forecast counts as done only
//! once its processing marker exists.

pub mod config;
pub mod error;
pub mod lock;
pub mod matcher;
pub mod notifier;
pub mod resolver;
pub mod results;
pub mod runner;

pub use config::{ConfigOverrides, DistortionBackend, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use matcher::CityMatcher;
pub use notifier::{
    HttpPushTransport, Language, LogTransport, Notifier, NotifyReport, PushMessage, PushTransport,
};
pub use resolver::{forecast_listing, resolve_candidates, slug_state, SlugState};
pub use runner::{analyze_only, Pipeline, RunReport};
