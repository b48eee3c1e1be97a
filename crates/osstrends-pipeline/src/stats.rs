//! Pool counters and the run summary
//!
//! Hierarchy:
//! - `PoolStats`: outcomes counted by the worker pool
//! - `Summary`: one ingestion run, pool stats plus search results

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use osstrends_core::fmt_num;

/// Outcomes counted by the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub accepted: u64,
    pub rejected: u64,
    /// Every failed attempt
    pub failed_attempts: u64,
    /// Distinct items that needed at least one retry
    pub retried: u64,
    /// Items left on the queue by an interrupted run
    pub abandoned: u64,
}

/// Result of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub locations: usize,
    /// Locations skipped after their search kept failing
    pub failed_locations: usize,
    pub candidates: u64,
    pub pool: PoolStats,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl Summary {
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Ingestion")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Locations"),
            Cell::new(format!(
                "{} ({} failed)",
                self.locations, self.failed_locations
            )),
        ]);
        table.add_row(vec![
            Cell::new("Candidates"),
            Cell::new(fmt_num(self.candidates)),
        ]);
        table.add_row(vec![
            Cell::new("Accepted").fg(Color::Green),
            Cell::new(fmt_num(self.pool.accepted)).fg(Color::Green),
        ]);
        table.add_row(vec![
            Cell::new("Rejected"),
            Cell::new(fmt_num(self.pool.rejected)),
        ]);
        let failed_color = if self.pool.failed_attempts > 0 {
            Color::Yellow
        } else {
            Color::Reset
        };
        table.add_row(vec![
            Cell::new("Failed attempts").fg(failed_color),
            Cell::new(format!(
                "{} ({} items retried)",
                fmt_num(self.pool.failed_attempts),
                fmt_num(self.pool.retried)
            ))
            .fg(failed_color),
        ]);
        if self.interrupted {
            table.add_row(vec![
                Cell::new("Interrupted").fg(Color::Red),
                Cell::new(format!("{} items not processed", fmt_num(self.pool.abandoned)))
                    .fg(Color::Red),
            ]);
        }
        table.add_row(vec![
            Cell::new("Elapsed"),
            Cell::new(format!("{:.1}s", self.elapsed.as_secs_f64())),
        ]);

        format!("\n{table}")
    }

    /// Print table (TTY mode).
    pub fn print(&self) {
        eprintln!("{}", self.format_table());
    }

    /// Log summary lines (non-TTY mode).
    pub fn log(&self) {
        log::info!(
            "ingest complete: {} accepted, {} rejected of {} candidates in {}/{} locations [{:.1}s]",
            fmt_num(self.pool.accepted),
            fmt_num(self.pool.rejected),
            fmt_num(self.candidates),
            self.locations.saturating_sub(self.failed_locations),
            self.locations,
            self.elapsed.as_secs_f64()
        );
        if self.pool.failed_attempts > 0 {
            log::info!(
                "{} failed attempts, {} items retried",
                fmt_num(self.pool.failed_attempts),
                fmt_num(self.pool.retried)
            );
        }
        if self.interrupted {
            log::warn!(
                "run interrupted: {} items not processed",
                fmt_num(self.pool.abandoned)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_mentions_counts() {
        let summary = Summary {
            locations: 2,
            failed_locations: 1,
            candidates: 1234,
            pool: PoolStats {
                accepted: 1000,
                rejected: 234,
                failed_attempts: 3,
                retried: 2,
                abandoned: 0,
            },
            interrupted: false,
            elapsed: Duration::from_millis(1500),
        };
        let table = summary.format_table();
        assert!(table.contains("2 (1 failed)"));
        assert!(table.contains("1,234"));
        assert!(table.contains("3 (2 items retried)"));
        assert!(table.contains("1.5s"));
        assert!(!table.contains("Interrupted"));
    }

    #[test]
    fn interrupted_row() {
        let summary = Summary {
            interrupted: true,
            pool: PoolStats {
                abandoned: 7,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(summary.format_table().contains("7 items not processed"));
    }
}
