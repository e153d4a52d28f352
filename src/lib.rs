//! Explainable circular molecular fingerprints.
//!
//! This crate wires the explanation stages into a single call: molecule text
//! in, `(trace text, fingerprint)` out. A [`TraceSession`] owns the toolkit,
//! the shared [`MetricsCache`] and an optional [`PipelineMetrics`] observer,
//! so independent sessions never share hidden state.
//!
//! Two entry points exist:
//!
//! - [`TraceSession::explain`] is typed: an unparseable molecule is
//!   `Err(TraceError::InvalidMolecule)`, a molecule with no environments is
//!   `Ok` with an empty trace.
//! - [`reasoning_trace`] / [`TraceSession::reasoning_trace`] keep the flat
//!   binding contract: every failure collapses to an empty trace and an
//!   all-zero fingerprint.

pub mod config;

pub use explain::{
    assemble_trace, compute_metrics, count_set_bits, encode_fingerprint, extract_environments,
    fold_by_radius, format_token, token_radius, token_substructure, ByRadiusMap, ComplexityKey,
    ConfigError, EnvironmentOptions, Extraction, MetricsCache, PerCenterMap, TokenMetrics,
    TraceConfig, CHAIN_HEADER, DEFAULT_FINGERPRINT_SIZE, DEFAULT_RADIUS, MAX_FINGERPRINT_SIZE,
};
pub use toolkit::{GraphToolkit, MolecularToolkit, ToolkitError};

pub use crate::config::{ConfigLoadError, EcfpConfig};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn, Level};

/// Errors returned by [`TraceSession::explain`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("invalid trace config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid molecule text: {0}")]
    InvalidMolecule(ToolkitError),
}

/// Flat result of the binding contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    pub trace: String,
    /// One byte per bit, each 0 or 1.
    pub fingerprint: Vec<u8>,
}

impl TraceResult {
    /// Empty trace plus an all-zero fingerprint.
    pub fn sentinel(fingerprint_size: usize) -> Self {
        Self {
            trace: String::new(),
            fingerprint: vec![0; fingerprint_size],
        }
    }
}

/// Everything [`TraceSession::explain`] learned about one molecule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceReport {
    pub trace: String,
    pub fingerprint: Vec<u8>,
    pub per_center: PerCenterMap,
    /// Occurrences within the radius bound reported by the toolkit.
    pub occurrences: usize,
    /// Occurrences dropped because their environment could not be serialized.
    pub skipped: usize,
}

impl TraceReport {
    pub fn set_bits(&self) -> usize {
        count_set_bits(&self.fingerprint)
    }

    pub fn into_result(self) -> TraceResult {
        TraceResult {
            trace: self.trace,
            fingerprint: self.fingerprint,
        }
    }
}

/// Metrics observer for trace stages.
pub trait PipelineMetrics: Send + Sync {
    /// Parse plus environment extraction. `Err` only for unparseable input.
    fn record_extract(&self, latency: Duration, result: Result<(), TraceError>);
    fn record_fingerprint(&self, latency: Duration, set_bits: usize);
    fn record_assemble(&self, latency: Duration, lines: usize);
}

struct MetricsSpan<'a> {
    recorder: &'a dyn PipelineMetrics,
    start: Instant,
}

impl<'a> MetricsSpan<'a> {
    fn start(recorder: Option<&'a Arc<dyn PipelineMetrics>>) -> Option<Self> {
        recorder.map(|recorder| Self {
            recorder: recorder.as_ref(),
            start: Instant::now(),
        })
    }

    fn record_extract(self, result: Result<(), TraceError>) {
        self.recorder.record_extract(self.start.elapsed(), result);
    }

    fn record_fingerprint(self, set_bits: usize) {
        self.recorder
            .record_fingerprint(self.start.elapsed(), set_bits);
    }

    fn record_assemble(self, lines: usize) {
        self.recorder.record_assemble(self.start.elapsed(), lines);
    }
}

/// Owns the toolkit and the metrics cache shared by every call made through it.
///
/// Sessions are `Sync`; share one across threads behind an `Arc` to reuse
/// cached token metrics.
pub struct TraceSession<T: MolecularToolkit = GraphToolkit> {
    toolkit: T,
    cache: MetricsCache,
    metrics: Option<Arc<dyn PipelineMetrics>>,
}

impl TraceSession<GraphToolkit> {
    pub fn new() -> Self {
        Self::with_toolkit(GraphToolkit::new())
    }
}

impl Default for TraceSession<GraphToolkit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MolecularToolkit> TraceSession<T> {
    pub fn with_toolkit(toolkit: T) -> Self {
        Self {
            toolkit,
            cache: MetricsCache::new(),
            metrics: None,
        }
    }

    /// Install a stage observer.
    pub fn with_metrics(mut self, recorder: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = Some(recorder);
        self
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn cache(&self) -> &MetricsCache {
        &self.cache
    }

    /// Trace and fingerprint one molecule.
    pub fn explain(&self, text: &str, cfg: &TraceConfig) -> Result<TraceReport, TraceError> {
        cfg.validate()?;
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "ecfptrace.explain",
            radius = cfg.radius,
            input_len = text.len()
        );
        let _guard = span.enter();

        match self.explain_inner(text, cfg) {
            Ok(report) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(
                    centers = report.per_center.len(),
                    occurrences = report.occurrences,
                    skipped = report.skipped,
                    set_bits = report.set_bits(),
                    elapsed_micros,
                    "trace_success"
                );
                Ok(report)
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(error = %err, elapsed_micros, "trace_failure");
                Err(err)
            }
        }
    }

    fn explain_inner(&self, text: &str, cfg: &TraceConfig) -> Result<TraceReport, TraceError> {
        let extract_metrics = MetricsSpan::start(self.metrics.as_ref());
        let mol = match self.toolkit.parse_molecule(text) {
            Ok(mol) => mol,
            Err(err) => {
                let err = TraceError::InvalidMolecule(err);
                if let Some(span) = extract_metrics {
                    span.record_extract(Err(err.clone()));
                }
                return Err(err);
            }
        };
        let extraction =
            extract_environments(&self.toolkit, &mol, &EnvironmentOptions::from(cfg));
        if let Some(span) = extract_metrics {
            span.record_extract(Ok(()));
        }

        let fingerprint_metrics = MetricsSpan::start(self.metrics.as_ref());
        let fingerprint = encode_fingerprint(
            &self.toolkit,
            &mol,
            cfg.radius,
            cfg.fingerprint_size,
            cfg.isomeric,
        );
        if let Some(span) = fingerprint_metrics {
            span.record_fingerprint(count_set_bits(&fingerprint));
        }

        let assemble_metrics = MetricsSpan::start(self.metrics.as_ref());
        let trace = assemble_trace(
            &self.toolkit,
            &self.cache,
            &mol,
            &extraction.per_center,
            cfg.include_per_center,
        );
        if let Some(span) = assemble_metrics {
            span.record_assemble(if trace.is_empty() {
                0
            } else {
                trace.lines().count()
            });
        }

        Ok(TraceReport {
            trace,
            fingerprint,
            per_center: extraction.per_center,
            occurrences: extraction.occurrences,
            skipped: extraction.skipped,
        })
    }

    /// Binding contract: never fails, invalid input yields [`TraceResult::sentinel`].
    ///
    /// A `fingerprint_size` of 0 selects [`DEFAULT_FINGERPRINT_SIZE`]; larger
    /// sizes are clamped to [`MAX_FINGERPRINT_SIZE`].
    pub fn reasoning_trace(
        &self,
        text: &str,
        radius: u32,
        isomeric: bool,
        kekulize: bool,
        include_per_center: bool,
        fingerprint_size: usize,
    ) -> TraceResult {
        let fingerprint_size = match fingerprint_size {
            0 => DEFAULT_FINGERPRINT_SIZE,
            size => size.min(MAX_FINGERPRINT_SIZE),
        };
        let cfg = TraceConfig::new()
            .with_radius(radius)
            .with_isomeric(isomeric)
            .with_kekulize(kekulize)
            .with_per_center(include_per_center)
            .with_fingerprint_size(fingerprint_size);
        match self.explain(text, &cfg) {
            Ok(report) => report.into_result(),
            Err(_) => TraceResult::sentinel(fingerprint_size),
        }
    }

    /// Trace text only; empty for invalid input.
    pub fn trace_text(&self, text: &str, cfg: &TraceConfig) -> String {
        self.explain(text, cfg)
            .map(|report| report.trace)
            .unwrap_or_default()
    }
}

/// Binding contract over a fresh [`GraphToolkit`] session.
///
/// Each call gets its own metrics cache; hold a [`TraceSession`] to reuse
/// cached token metrics across calls.
pub fn reasoning_trace(
    text: &str,
    radius: u32,
    isomeric: bool,
    kekulize: bool,
    include_per_center: bool,
    fingerprint_size: usize,
) -> TraceResult {
    TraceSession::new().reasoning_trace(
        text,
        radius,
        isomeric,
        kekulize,
        include_per_center,
        fingerprint_size,
    )
}
