//! Run a synthetic census in parallel and print the composite ledger
//!
//! Cells cycle through issue ages and specified amounts so that the
//! composite mixes lives of different policy lengths.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use ul_account_value::{run_census, CensusCell, LedgerType, ProjectionConfig, RateTables, RunParameters};

#[derive(Parser)]
#[command(name = "run_census", version, about = "Illustrate a synthetic census and its composite")]
struct Cli {
    /// Number of cells
    #[arg(long, default_value_t = 1_000)]
    cells: usize,

    /// Youngest issue age
    #[arg(long, default_value_t = 25)]
    min_age: usize,

    /// Oldest issue age
    #[arg(long, default_value_t = 65)]
    max_age: usize,

    /// Annual premium per $1,000 of specified amount
    #[arg(long, default_value_t = 25.0)]
    premium_rate: f64,

    /// Use partial mortality for the composite
    #[arg(long)]
    partial_mortality: bool,

    /// Illustrate on the regulated ledger
    #[arg(long)]
    ill_reg: bool,
}

fn synthetic_census(cli: &Cli, tables: &RateTables) -> Vec<CensusCell> {
    let ages = cli.max_age.saturating_sub(cli.min_age) + 1;
    (0..cli.cells)
        .map(|i| {
            let issue_age = cli.min_age + i % ages;
            let specamt = 50_000.0 * (1 + i % 5) as f64;
            let length = tables.product.policy_length(issue_age);
            let mut params = RunParameters::level(issue_age, length, specamt, cli.premium_rate * specamt / 1_000.0);
            params.use_partial_mortality = cli.partial_mortality;
            params.into()
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();
    let tables = RateTables::sample_product();
    let cells = synthetic_census(&cli, &tables);
    println!("Generated {} cells in {:?}", cells.len(), start.elapsed());

    let ledger_type = if cli.ill_reg {
        LedgerType::IllustrationReg
    } else {
        LedgerType::NonIllustrationReg
    };

    println!("Running illustrations...");
    let run_start = Instant::now();
    let result = run_census(&cells, &tables, &ProjectionConfig::default(), ledger_type).context("census run failed")?;
    println!("Illustrations complete in {:?}", run_start.elapsed());

    let lapsed = result
        .cells
        .iter()
        .filter_map(|l| l.current().map(|v| v.lapse_year < l.len()))
        .filter(|&lapsed| lapsed)
        .count();
    let mecs = result.cells.iter().filter(|l| l.invariant.is_mec).count();

    let composite = &result.composite;
    let Some(curr) = composite.current() else {
        anyhow::bail!("composite has no current basis");
    };

    println!("\nComposite (current basis):");
    println!(
        "{:>4} {:>12} {:>16} {:>16} {:>16} {:>14}",
        "Year", "Lives", "Premium", "AcctValue", "DeathBen", "Claims"
    );
    println!("{}", "-".repeat(84));
    for t in 0..composite.len() {
        let lives = composite.invariant.inforce_lives[t];
        if 0.0 == lives {
            break;
        }
        println!(
            "{:>4} {:>12.4} {:>16.2} {:>16.2} {:>16.2} {:>14.2}",
            t + 1,
            lives,
            composite.invariant.gross_pmt[t],
            curr.acct_value[t],
            curr.death_benefit[t],
            curr.claims_gross[t],
        );
    }

    println!("\nCensus Summary:");
    println!("  Cells:  {}", result.cells.len());
    println!("  Lapsed: {}", lapsed);
    println!("  MECs:   {}", mecs);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
