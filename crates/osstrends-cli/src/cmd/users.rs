//! Users subcommand - list stored developers

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, CellAlignment};
use osstrends_core::fmt_num;
use osstrends_store::{StoredUser, UserStore};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Only users of this normalized location
    #[arg(long)]
    pub location: Option<String>,

    /// Only users with code in this language
    #[arg(long)]
    pub language: Option<String>,

    /// Show at most this many users
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Store snapshot path
    #[arg(short, long)]
    pub store: Option<PathBuf>,
}

/// Largest first; language bytes when filtering by language.
fn sort_users(users: &mut [StoredUser], language: Option<&str>) {
    users.sort_by(|a, b| {
        let key = |u: &StoredUser| match language {
            Some(lang) => u.bytes_in(lang),
            None => u.total_code_size,
        };
        key(b).cmp(&key(a)).then_with(|| a.login.cmp(&b.login))
    });
}

pub fn run(args: UsersArgs, config: &Config) -> Result<()> {
    let store = super::open_store(&super::store_path(args.store, config))?;
    let mut users = store.query_users(args.location.as_deref(), args.language.as_deref())?;
    if users.is_empty() {
        eprintln!("No matching users");
        return Ok(());
    }
    sort_users(&mut users, args.language.as_deref());

    let total = users.len();
    let shown = args.limit.unwrap_or(total).min(total);

    let mut header = vec!["Login", "Location", "Total bytes"];
    if let Some(lang) = args.language.as_deref() {
        header.push(lang);
    }
    let mut table = super::table(&header);
    for user in &users[..shown] {
        let mut row = vec![
            Cell::new(&user.login),
            Cell::new(user.location_normalized.as_deref().unwrap_or("-")),
            Cell::new(fmt_num(user.total_code_size)).set_alignment(CellAlignment::Right),
        ];
        if let Some(lang) = args.language.as_deref() {
            row.push(Cell::new(fmt_num(user.bytes_in(lang))).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    println!("{table}");
    if shown < total {
        eprintln!("{shown} of {total} users shown");
    }
    Ok(())
}
