//! Calculate command
//!
//! Validates caller input, runs the estimator and prints the breakdown.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use living_cost::app::LivingCostApp;
use living_cost::config::Config;
use living_cost::living_cost::{CalculationInput, CalculationResult, OwnerRef};
use living_cost::CostError;

/// Estimate living costs for a postal code and income
#[derive(Debug, Clone, Parser)]
pub struct CalculateArgs {
    /// Postal code, 7 digits (hyphen allowed, e.g. 100-0001)
    #[arg(short, long)]
    pub postal_code: String,

    /// Annual income in yen (1 to 100,000,000)
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(
        CalculationInput::MIN_ANNUAL_INCOME..=CalculationInput::MAX_ANNUAL_INCOME
    ))]
    pub income: i64,

    /// Save the result to history under this owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

/// Execute the calculate command
pub async fn execute(cfg: &Config, args: CalculateArgs) -> Result<()> {
    let input = build_input(&args)?;
    let app = LivingCostApp::from_config(cfg).await?;

    match app.estimator.calculate(&input).await {
        Ok(result) => {
            match args.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => display_result(&result, input.owner.is_some()),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), user_message(&e));
            Err(e.into())
        }
    }
}

fn build_input(args: &CalculateArgs) -> Result<CalculationInput, CostError> {
    // Format errors surface before any lookup happens
    living_cost::address::PostalCode::parse(&args.postal_code)?;

    let mut input = CalculationInput::new(args.postal_code.clone(), args.income);
    if let Some(owner) = args.owner.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        input = input.with_owner(OwnerRef::new(owner));
    }
    Ok(input)
}

fn user_message(error: &CostError) -> &'static str {
    match error {
        CostError::InvalidParameter(_) => "The postal code or a lookup response was invalid.",
        CostError::PostalCodeNotFound(_) => "No address is registered for that postal code.",
        CostError::ExternalApi(_) => "The postal code service could not be reached. Please try again later.",
        CostError::UnknownRegion(_) => "No rent data is available for that region.",
        CostError::Persistence(_) => "The calculation could not be saved.",
    }
}

fn display_result(result: &CalculationResult, saved: bool) {
    println!("{}", "Living cost estimate".green().bold());
    println!("  Postal code:    {}", result.postal_code);
    println!("  Region:         {}", result.region_name);
    println!("  Annual income:  {}", yen(result.annual_income));
    println!();
    println!("  Rent:           {}", yen(result.monthly_rent));
    println!("  Utilities:      {}", yen(result.monthly_utilities));
    println!("  Food:           {}", yen(result.monthly_food));
    println!("  Communication:  {}", yen(result.monthly_communication));
    println!("  Others:         {}", yen(result.monthly_others));
    println!("  {}", "─".repeat(30).dimmed());
    println!("  Monthly total:  {}", yen(result.monthly_total()).bold());
    println!("  Annual total:   {}", yen(result.annual_total()).bold());

    if saved {
        println!();
        println!("{}", "Saved to history".dimmed());
    }
}

/// Format an amount with thousands separators
pub(crate) fn yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-¥{}", grouped)
    } else {
        format!("¥{}", grouped)
    }
}
