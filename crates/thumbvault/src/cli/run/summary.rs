//! Progress display and end-of-run summary for `thumbvault run`.

use indicatif::{ProgressBar, ProgressStyle};
use thumbvault_core::RunReport;

pub(super) fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Print a formatted summary table for one run.
pub(super) fn print_summary(label: &str, report: &RunReport) {
    let secs = report.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        report.attempted as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("    Summary: {}", label);
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", report.succeeded);
    if report.failed_total() > 0 {
        eprintln!("    Failed:       {:>8}", report.failed_total());
        for (stage, count) in [
            ("fetch", report.failed.fetch),
            ("write", report.failed.write),
            ("resize", report.failed.resize),
            ("store", report.failed.store),
        ] {
            if count > 0 {
                eprintln!("      {:<10}  {:>8}", stage, count);
            }
        }
    }
    if report.cleanup_failures > 0 {
        eprintln!("    Cleanup errs: {:>8}", report.cleanup_failures);
    }
    if report.worker_panics > 0 {
        eprintln!("    Panics:       {:>8}", report.worker_panics);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.attempted);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
