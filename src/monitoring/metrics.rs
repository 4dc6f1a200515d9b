use anyhow::Result;
use dashmap::DashMap;

#[cfg(feature = "metrics")]
use anyhow::Context;
#[cfg(feature = "metrics")]
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PollOutcome {
    Ok,
    Error,
    /// Fetch finished after its loop was stopped.
    Dropped,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Ok => "ok",
            PollOutcome::Error => "error",
            PollOutcome::Dropped => "dropped",
        }
    }
}

/// Poll counters per loop and outcome
pub struct PollMetrics {
    counts: DashMap<(&'static str, PollOutcome), u64>,
    #[cfg(feature = "metrics")]
    registry: Registry,
    #[cfg(feature = "metrics")]
    polls_total: IntCounterVec,
}

impl PollMetrics {
    #[cfg(feature = "metrics")]
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let polls_total = IntCounterVec::new(
            Opts::new("diamondwatch_polls_total", "Upstream polls by loop and outcome"),
            &["poller", "outcome"],
        )
        .context("Failed to build poll counter")?;
        registry
            .register(Box::new(polls_total.clone()))
            .context("Failed to register poll counter")?;

        Ok(Self {
            counts: DashMap::new(),
            registry,
            polls_total,
        })
    }

    #[cfg(not(feature = "metrics"))]
    pub fn new() -> Result<Self> {
        Ok(Self {
            counts: DashMap::new(),
        })
    }

    pub fn record(&self, poller: &'static str, outcome: PollOutcome) {
        *self.counts.entry((poller, outcome)).or_insert(0) += 1;

        #[cfg(feature = "metrics")]
        self.polls_total
            .with_label_values(&[poller, outcome.as_str()])
            .inc();
    }

    pub fn count(&self, poller: &'static str, outcome: PollOutcome) -> u64 {
        self.counts.get(&(poller, outcome)).map(|c| *c).unwrap_or(0)
    }

    fn sorted(&self) -> Vec<((&'static str, PollOutcome), u64)> {
        let mut rows: Vec<_> = self.counts.iter().map(|e| (*e.key(), *e.value())).collect();
        rows.sort();
        rows
    }

    /// One line per loop, for the `stats` command
    pub fn summary(&self) -> String {
        let rows = self.sorted();
        if rows.is_empty() {
            return "No polls yet".to_string();
        }

        rows.iter()
            .map(|((poller, outcome), n)| format!("{:<10} {:<8} {}", poller, outcome.as_str(), n))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Counts dumped at shutdown. Prometheus text exposition with the `metrics`
    /// feature, the `stats` table otherwise.
    #[cfg(feature = "metrics")]
    pub fn report(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not UTF-8")
    }

    #[cfg(not(feature = "metrics"))]
    pub fn report(&self) -> Result<String> {
        Ok(self.summary())
    }
}
