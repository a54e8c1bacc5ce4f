use crate::domain::models::{AcquisitionOutcome, FailureReason, MediaAsset};
use crate::workflows::batch::BatchReport;

pub fn outcome_message(outcome: &AcquisitionOutcome) -> String {
    match outcome {
        AcquisitionOutcome::Exist => "Subtitles already exist".to_string(),
        AcquisitionOutcome::NotFound => "Could not find subtitles".to_string(),
        AcquisitionOutcome::Downloaded(languages) => {
            format!("Downloaded subtitles ({})", languages.join(", "))
        }
        AcquisitionOutcome::Failed(FailureReason::UnsupportedMetadata) => {
            "Skipped (unsupported nfo)".to_string()
        }
        AcquisitionOutcome::Failed(reason) => format!("Failed download ({reason})"),
        AcquisitionOutcome::QuotaExhausted => "Download limit reached".to_string(),
    }
}

pub fn print_outcome(asset: &MediaAsset, outcome: &AcquisitionOutcome) {
    if *outcome == AcquisitionOutcome::QuotaExhausted {
        println!("\nOpenSubtitles download limit reached. Try again later.");
        return;
    }
    println!("{:30} - {}", outcome_message(outcome), asset.base.display());
}

pub fn summary_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    let stop_msg = if report.stopped_early {
        " (reached limit)"
    } else {
        ""
    };

    let total = report.total();
    if total > 0 {
        lines.push(format!("Done{stop_msg}. Out of {total} media files:"));
        lines.push(format!(
            "{} have subtitles ({} already had subtitles, {} were downloaded now.)",
            report.exist + report.downloaded,
            report.exist,
            report.downloaded
        ));
        lines.push(format!(
            "{} don't have subtitles ({} not found in opensubtitles db, {} failed to download.)",
            report.not_found + report.failed,
            report.not_found,
            report.failed
        ));
    } else {
        lines.push(format!("Done{stop_msg}. No media files processed."));
    }
    if report.skipped > 0 {
        lines.push(format!(
            "{} nfo file(s) skipped (no catalog identifier).",
            report.skipped
        ));
    }
    lines
}

pub fn print_summary(report: &BatchReport) {
    println!();
    for line in summary_lines(report) {
        println!("{line}");
    }
}
