// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Progress bars for file transfers.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// A byte-count progress bar for copying `label`.
pub fn transfer_bar(label: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());
    Ok(pb)
}

/// Adapter from the session's progress callback to a bar.
pub fn report_to(pb: &ProgressBar) -> impl FnMut(u64, u64) + '_ {
    move |done, total| {
        if pb.length() != Some(total) {
            pb.set_length(total);
        }
        pb.set_position(done);
    }
}
