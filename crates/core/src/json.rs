// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON rendering of benchmark reports.

use std::io::Write;

use crate::error::Result;
use crate::report::Report;

/// Write a report as pretty-printed JSON followed by a newline.
pub fn write_report<W: Write>(report: &Report, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}
