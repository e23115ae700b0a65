use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use living_cost::config::{self, Config};
use living_cost::living_cost::RateTable;
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Prints the effective configuration followed by the rate table in use
pub fn show(cfg: &Config) -> Result<()> {
    info!("Displaying configuration");

    println!("{}", "Current Configuration:".green().bold());
    println!();
    println!("{}", toml::to_string_pretty(cfg)?);

    let rates = RateTable::from_config(&cfg.rates);
    println!("{}", "Regions:".bold());
    println!("{}", regions_table(&rates));
    println!();
    println!("{}", "Fallback prefixes:".bold());
    for (prefix, region) in rates.prefixes() {
        println!("  {} → {}", prefix, region);
    }

    Ok(())
}

/// Execute the config validate command
pub fn validate(path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!("Validating configuration file");

    let cfg = match config::load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{} {:#}", "✗ Configuration is invalid:".red(), e);
            return Err(e);
        }
    };
    let rates = RateTable::from_config(&cfg.rates);

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Lookup URL: {}", cfg.lookup.base_url);
    println!(
        "  Lookup timeout: {}s, retries: {}",
        cfg.lookup.timeout_seconds, cfg.lookup.max_retries
    );
    println!("  Database: {}", cfg.database.path);
    println!("  Regions: {}", rates.regions().len());
    println!("  Fallback prefixes: {}", rates.prefixes().len());

    Ok(())
}

fn regions_table(rates: &RateTable) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Code", "Region", "Average rent"]);
    for region in rates.regions() {
        table.add_row(vec![
            region.code.clone(),
            region.name.clone(),
            region.average_rent.to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_table_lists_builtin_regions() {
        let rendered = regions_table(&RateTable::builtin()).to_string();
        assert!(rendered.contains("東京都"));
        assert!(rendered.contains("80000"));
        assert!(rendered.contains("Average rent"));
    }
}
