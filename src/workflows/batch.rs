use log::{info, warn};
use std::path::PathBuf;

use crate::domain::models::{AcquisitionOutcome, FailureReason, MediaAsset};
use crate::domain::ports::{AttributeParser, MetadataReader, SubtitleCatalog};
use crate::workflows::grabber::SubtitleGrabber;

/// Outcome tally of one batch pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub exist: usize,
    pub downloaded: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Assets whose metadata file carries no catalog identifier.
    pub skipped: usize,
    /// The batch stopped at the download limit, leaving assets unprocessed.
    pub stopped_early: bool,
    pub results: Vec<(PathBuf, AcquisitionOutcome)>,
}

impl BatchReport {
    fn record(&mut self, asset: &MediaAsset, outcome: AcquisitionOutcome) {
        match &outcome {
            AcquisitionOutcome::Exist => self.exist += 1,
            AcquisitionOutcome::NotFound => self.not_found += 1,
            AcquisitionOutcome::Downloaded(_) => self.downloaded += 1,
            AcquisitionOutcome::Failed(FailureReason::UnsupportedMetadata) => self.skipped += 1,
            AcquisitionOutcome::Failed(_) => self.failed += 1,
            AcquisitionOutcome::QuotaExhausted => self.stopped_early = true,
        }
        self.results.push((asset.base.clone(), outcome));
    }

    /// Assets that reached a verdict (skipped and quota-halted ones excluded).
    pub fn total(&self) -> usize {
        self.exist + self.downloaded + self.not_found + self.failed
    }
}

/// Runs the grabber over a list of assets, one at a time.
pub struct BatchRunner<C, M, P> {
    grabber: SubtitleGrabber<C, M, P>,
}

impl<C, M, P> BatchRunner<C, M, P>
where
    C: SubtitleCatalog,
    M: MetadataReader,
    P: AttributeParser,
{
    pub fn new(grabber: SubtitleGrabber<C, M, P>) -> Self {
        Self { grabber }
    }

    #[cfg(test)]
    pub fn grabber(&self) -> &SubtitleGrabber<C, M, P> {
        &self.grabber
    }

    /// Process `assets` in order, calling `on_outcome` as each one is resolved.
    pub fn run<F>(&mut self, assets: &[MediaAsset], mut on_outcome: F) -> BatchReport
    where
        F: FnMut(&MediaAsset, &AcquisitionOutcome),
    {
        let mut report = BatchReport::default();

        for asset in assets {
            let outcome = match self.grabber.grab(asset) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Failed to process {:?}: {e:#}", asset.nfo_path);
                    AcquisitionOutcome::Failed(FailureReason::Collaborator(e.to_string()))
                }
            };

            on_outcome(asset, &outcome);
            let quota_exhausted = outcome == AcquisitionOutcome::QuotaExhausted;
            report.record(asset, outcome);

            if quota_exhausted {
                info!("Download limit reached, stopping batch");
                break;
            }
        }

        report
    }
}
