//! Prometheus metrics registry.

use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, histogram::Histogram},
    registry::Registry,
};

/// Duration histogram buckets (in seconds).
/// Covers 1ms to 10s; large documents with many rules land in the upper range.
const DURATION_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Validation run labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ValidationLabels {
    /// `validate` or `publish`.
    pub endpoint: String,
    /// `passed`, `failed` or `error`.
    pub outcome: String,
}

/// Finding labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SeverityLabels {
    pub severity: String,
}

/// Upload rejection labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectionLabels {
    pub reason: String,
}

/// Publication labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PublicationLabels {
    /// `published` or `failed`.
    pub outcome: String,
}

/// Metrics registry holding all oasgate metrics.
pub struct MetricsRegistry {
    /// The prometheus-client registry for encoding.
    pub registry: Registry,

    pub validations_total: Family<ValidationLabels, Counter>,
    pub validation_duration_seconds: Family<ValidationLabels, Histogram>,
    pub findings_total: Family<SeverityLabels, Counter>,
    pub upload_rejections_total: Family<RejectionLabels, Counter>,
    pub publications_total: Family<PublicationLabels, Counter>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let validations_total = Family::<ValidationLabels, Counter>::default();
        registry.register(
            "oasgate_validations",
            "Total number of documents run through the validation pipeline",
            validations_total.clone(),
        );

        let validation_duration_seconds =
            Family::<ValidationLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(DURATION_BUCKETS.iter().cloned())
            });
        registry.register(
            "oasgate_validation_duration_seconds",
            "Time spent loading, evaluating and classifying one document",
            validation_duration_seconds.clone(),
        );

        let findings_total = Family::<SeverityLabels, Counter>::default();
        registry.register(
            "oasgate_findings",
            "Total number of findings reported, by severity",
            findings_total.clone(),
        );

        let upload_rejections_total = Family::<RejectionLabels, Counter>::default();
        registry.register(
            "oasgate_upload_rejections",
            "Total number of uploads refused before validation",
            upload_rejections_total.clone(),
        );

        let publications_total = Family::<PublicationLabels, Counter>::default();
        registry.register(
            "oasgate_publications",
            "Total number of publish attempts for validated documents",
            publications_total.clone(),
        );

        Self {
            registry,
            validations_total,
            validation_duration_seconds,
            findings_total,
            upload_rejections_total,
            publications_total,
        }
    }

    /// Record one validation run.
    pub fn record_validation(&self, endpoint: &str, outcome: &str, duration_secs: f64) {
        let labels = ValidationLabels {
            endpoint: endpoint.to_string(),
            outcome: outcome.to_string(),
        };
        self.validations_total.get_or_create(&labels).inc();
        self.validation_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Add `count` findings of one severity.
    pub fn record_findings(&self, severity: &str, count: u64) {
        if count == 0 {
            return;
        }
        let labels = SeverityLabels {
            severity: severity.to_string(),
        };
        self.findings_total.get_or_create(&labels).inc_by(count);
    }

    /// Record an upload refused before validation.
    pub fn record_upload_rejection(&self, reason: &str) {
        let labels = RejectionLabels {
            reason: reason.to_string(),
        };
        self.upload_rejections_total.get_or_create(&labels).inc();
    }

    /// Record a publish attempt.
    pub fn record_publication(&self, outcome: &str) {
        let labels = PublicationLabels {
            outcome: outcome.to_string(),
        };
        self.publications_total.get_or_create(&labels).inc();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
