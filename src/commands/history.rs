//! History query command
//!
//! Lists saved calculations page by page, newest first.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use living_cost::config::{Config, HistoryConfig};
use living_cost::history::{database, HistoryRecord, HistoryStore, Page, PageRequest, SearchFilter};
use living_cost::living_cost::OwnerRef;

use super::calculate::yen;

/// Query saved calculations
#[derive(Debug, Clone, Parser)]
pub struct HistoryArgs {
    /// Filter by owner
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Filter by postal code (hyphen allowed)
    #[arg(short, long)]
    pub postal_code: Option<String>,

    /// Minimum annual income, inclusive
    #[arg(long)]
    pub min_income: Option<i64>,

    /// Maximum annual income, inclusive
    #[arg(long)]
    pub max_income: Option<i64>,

    /// Zero-based page number
    #[arg(long, default_value = "0")]
    pub page: u32,

    /// Page size (defaults to history.default_page_size)
    #[arg(short, long)]
    pub size: Option<u32>,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

/// Execute the history command
pub async fn execute(cfg: &Config, args: HistoryArgs) -> Result<()> {
    let filter = build_filter(&args);
    let request = PageRequest::new(args.page, page_size(&cfg.history, args.size))?;

    let pool = database::connect(&cfg.database).await?;
    let store = HistoryStore::new(pool);
    let page = store.page(&filter, request).await?;

    match args.format.as_str() {
        "json" => {
            let body = serde_json::json!({
                "items": page.items,
                "page_number": page.page_number,
                "page_size": page.page_size,
                "total_count": page.total_count,
                "total_pages": page.total_pages(),
                "has_next": page.has_next(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => display_page(&page),
    }

    Ok(())
}

fn build_filter(args: &HistoryArgs) -> SearchFilter {
    SearchFilter {
        owner: args.owner.as_deref().map(OwnerRef::new),
        postal_code: args.postal_code.clone(),
        min_annual_income: args.min_income,
        max_annual_income: args.max_income,
    }
}

/// Requested size, or the configured default, capped at the configured maximum
fn page_size(history: &HistoryConfig, requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(history.default_page_size)
        .min(history.max_page_size)
}

fn display_page(page: &Page<HistoryRecord>) {
    if page.items.is_empty() {
        println!("{}", "No calculations found".yellow());
        println!("  Total matching: {}", page.total_count);
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "ID", "Created", "Owner", "Postal code", "Region", "Annual income", "Monthly total", "Annual total",
    ]);

    for record in &page.items {
        let result = &record.result;
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(record.owner.as_str()),
            Cell::new(result.postal_code.as_str()),
            Cell::new(&result.region_name),
            Cell::new(yen(result.annual_income)).set_alignment(CellAlignment::Right),
            Cell::new(yen(result.monthly_total())).set_alignment(CellAlignment::Right),
            Cell::new(yen(result.annual_total())).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
    println!(
        "Page {} of {} ({} matching){}",
        page.page_number + 1,
        page.total_pages().max(1),
        page.total_count,
        if page.has_next() { ", more available with --page" } else { "" }
    );
}
