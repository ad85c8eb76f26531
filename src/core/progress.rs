// Copyright @yucwang 2026

use indicatif::{ ProgressBar, ProgressStyle };

/// Progress bar over `len` steps, hidden when `enabled` is false.
pub fn progress_bar(len: u64, unit: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len);
    let template = format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {}", unit);
    progress.set_style(
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress
}
