//! Stats subcommand - language totals per location

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, CellAlignment, Color};
use osstrends_core::fmt_num;
use osstrends_store::{UserStore, location_overview};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Normalized location name; omit to list all locations
    pub location: Option<String>,

    /// Store snapshot path
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

pub fn run(args: StatsArgs, config: &Config) -> Result<()> {
    let store = super::open_store(&super::store_path(args.store, config))?;

    let Some(location) = args.location else {
        let users = store.query_users(None, None)?;
        let overview = location_overview(&users);
        if overview.is_empty() {
            eprintln!("No locations in store");
            return Ok(());
        }
        let mut table = super::table(&["Location", "Developers", "Bytes"]);
        for row in &overview {
            table.add_row(vec![
                Cell::new(&row.location),
                Cell::new(fmt_num(row.users)).set_alignment(CellAlignment::Right),
                Cell::new(fmt_num(row.total_bytes)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{table}");
        return Ok(());
    };

    let aggregate = store.location_aggregate(&location)?;
    if aggregate.is_empty() {
        eprintln!("No developers stored for {location}");
        return Ok(());
    }

    let total = aggregate.total_bytes();
    let mut table = super::table(&["Language", "Bytes", "%", "Developers"]);
    for row in aggregate.ranked() {
        let pct = if total > 0 {
            row.bytes as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&row.language),
            Cell::new(fmt_num(row.bytes)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{pct:.1}")).set_alignment(CellAlignment::Right),
            Cell::new(fmt_num(row.developers)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").fg(Color::Green),
        Cell::new(fmt_num(total))
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("{location}\n{table}");
    Ok(())
}
