use crate::agent::ClassifierAgent;
use crate::classifier::Classification;
use crate::config::{MonitoringConfig, OtpConfig};
use crate::dedup::DedupTracker;
use crate::display;
use crate::fetch::MessageSource;
use crate::filtering::SourceFilter;
use crate::message::SmsMessage;
use crate::otp::{OtpCandidate, OtpExtractor};
use crate::parser;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// One fully enriched pipeline result, handed to the display collaborator.
#[derive(Debug, Clone)]
pub struct MessageReport {
    pub message: SmsMessage,
    /// Label of the filter entry that matched the sender, if any.
    pub source_label: Option<String>,
    pub otp: Option<OtpCandidate>,
    pub classification: Classification,
}

/// The polling monitor. Drives strictly sequential cycles: fetch → parse →
/// dedup → per-record extract/classify → render. The first fetch is a
/// priming pass that only seeds the dedup state and emits nothing.
pub struct SmsMonitor<S> {
    source: S,
    filter: SourceFilter,
    extractor: OtpExtractor,
    agent: ClassifierAgent,
    tracker: DedupTracker,
    monitoring: MonitoringConfig,
    otp: OtpConfig,
}

impl<S: MessageSource> SmsMonitor<S> {
    pub fn new(
        source: S,
        filter: SourceFilter,
        extractor: OtpExtractor,
        agent: ClassifierAgent,
        monitoring: MonitoringConfig,
        otp: OtpConfig,
    ) -> Self {
        SmsMonitor {
            source,
            filter,
            extractor,
            agent,
            tracker: DedupTracker::new(),
            monitoring,
            otp,
        }
    }

    /// Run until the shutdown signal fires. Cancellation is cooperative:
    /// it is observed between cycles, and an in-flight cycle either
    /// completes or is cut short by the fetch collaborator's own timeout.
    /// Dedup state is only ever updated after a cycle parses successfully.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        log::info!("loading existing messages...");
        match self.prime().await {
            Ok(count) => {
                log::info!("loaded {count} existing messages; watching for new SMS")
            }
            Err(e) => log::warn!("initial load failed, starting with empty state: {e:#}"),
        }

        let period = Duration::from_millis(self.monitoring.poll_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(reports) => {
                            for report in &reports {
                                display::render_report(report, self.otp.highlight_threshold);
                            }
                        }
                        // A failed cycle yields zero records and leaves the
                        // tracker untouched; the next tick tries again.
                        Err(e) => log::warn!("poll cycle failed: {e:#}"),
                    }
                }
            }
        }

        log::info!("monitoring stopped");
        Ok(())
    }

    /// Initial unfiltered fetch. Seeds the seen-set and watermark so the
    /// backlog is never re-emitted; produces no output.
    pub async fn prime(&mut self) -> Result<usize> {
        let raw = self.source.fetch_since(0).await?;
        let batch = parser::parse(&raw);
        let count = batch.len();
        self.tracker.observe(batch);
        Ok(count)
    }

    /// One polling cycle. Returns the enriched reports for records never
    /// seen before, in fetch order.
    pub async fn poll_once(&mut self) -> Result<Vec<MessageReport>> {
        let since = self.tracker.query_since();
        let raw = self.source.fetch_since(since).await?;
        let batch = parser::parse(&raw);
        let fresh = self.tracker.observe(batch);

        let mut reports = Vec::with_capacity(fresh.len());
        for message in fresh {
            if !self.filter.should_include(&message.address) {
                log::debug!("sender {} filtered out", message.address);
                continue;
            }

            let otp = if self.otp.enabled {
                self.extractor.extract(&message)
            } else {
                None
            };

            // Sequential on purpose: output order must match fetch order.
            let classification = self
                .agent
                .classify(&message.body, &message.address, otp.as_ref())
                .await;

            let source_label = self.filter.match_label(&message.address).map(str::to_string);

            reports.push(MessageReport {
                message,
                source_label,
                otp,
                classification,
            });
        }

        Ok(reports)
    }

    pub fn tracker(&self) -> &DedupTracker {
        &self.tracker
    }
}
