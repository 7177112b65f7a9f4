//! UL illustration CLI
//!
//! Illustrates one life on the sample product and prints the yearly ledger

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use ul_account_value::policy::{DbOption, DefnLifeIns, Mode};
use ul_account_value::{
    Basis, IllustrationEngine, LedgerType, ProjectionConfig, RateTables, RunParameters, SolveSpec, SolveTarget,
    SolveType,
};

#[derive(Parser)]
#[command(name = "ul_illustrate", version, about = "Illustrate one universal life policy")]
struct Cli {
    /// Issue age
    #[arg(long, default_value_t = 45)]
    issue_age: usize,

    /// Specified amount
    #[arg(long, default_value_t = 100_000.0)]
    specamt: f64,

    /// Employee premium per payment
    #[arg(long, default_value_t = 2_500.0)]
    premium: f64,

    /// Employee payment mode
    #[arg(long, value_enum, default_value = "annual")]
    mode: ModeArg,

    /// Death benefit option
    #[arg(long, value_enum, default_value = "a")]
    db_option: DbOptionArg,

    /// Use the cash value accumulation test instead of the guideline premium test
    #[arg(long)]
    cvat: bool,

    /// Share of net premium allocated to the separate account
    #[arg(long, default_value_t = 0.0)]
    sep_acct: f64,

    /// Illustrate on the regulated ledger (adds the midpoint basis)
    #[arg(long)]
    ill_reg: bool,

    /// Solve for this amount before illustrating
    #[arg(long, value_enum)]
    solve: Option<SolveArg>,

    /// Solve target: cash surrender value at the target year; endowment if absent
    #[arg(long)]
    target_csv: Option<f64>,

    /// Policy year (1-based) at which the target is tested
    #[arg(long)]
    target_year: Option<usize>,

    /// Print every basis instead of current only
    #[arg(long)]
    all_bases: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Annual,
    Semiannual,
    Quarterly,
    Monthly,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Annual => Mode::Annual,
            ModeArg::Semiannual => Mode::Semiannual,
            ModeArg::Quarterly => Mode::Quarterly,
            ModeArg::Monthly => Mode::Monthly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DbOptionArg {
    A,
    B,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolveArg {
    EePremium,
    ErPremium,
    Specamt,
    Loan,
    Withdrawal,
}

impl From<SolveArg> for SolveType {
    fn from(s: SolveArg) -> Self {
        match s {
            SolveArg::EePremium => SolveType::EePremium,
            SolveArg::ErPremium => SolveType::ErPremium,
            SolveArg::Specamt => SolveType::SpecAmt,
            SolveArg::Loan => SolveType::Loan,
            SolveArg::Withdrawal => SolveType::Withdrawal,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let tables = RateTables::sample_product();
    let length = tables.product.policy_length(cli.issue_age);
    if 0 == length {
        bail!("issue age {} is at or past maturity", cli.issue_age);
    }

    let mut params = RunParameters::level(cli.issue_age, length, cli.specamt, cli.premium);
    params.ee_mode = vec![cli.mode.into(); length];
    params.db_option = vec![
        match cli.db_option {
            DbOptionArg::A => DbOption::A,
            DbOptionArg::B => DbOption::B,
        };
        length
    ];
    if cli.cvat {
        params.defn_life_ins = DefnLifeIns::Cvat;
    }
    params.sep_acct_allocation = cli.sep_acct;

    let ledger_type = if cli.ill_reg {
        LedgerType::IllustrationReg
    } else {
        LedgerType::NonIllustrationReg
    };

    let solve = cli.solve.map(|s| {
        let mut spec = SolveSpec::endowment(s.into(), length);
        if let Some(csv) = cli.target_csv {
            spec.target = SolveTarget::CashSurrenderValue(csv);
        }
        if let Some(year) = cli.target_year {
            spec.target_year = year;
        }
        spec
    });

    let engine = IllustrationEngine::new(params, &tables, ProjectionConfig::default(), ledger_type)
        .context("invalid illustration input")?;
    let ledger = engine.run(solve.as_ref()).context("illustration failed")?;

    println!("UL Illustration - {}", tables.product.name);
    println!("=======================\n");
    println!("  Issue Age:       {}", cli.issue_age);
    println!("  Specified Amt:   ${:.2}", ledger.invariant.specamt[0]);
    println!("  Initial Premium: ${:.2}", ledger.invariant.init_prem);
    println!("  GLP / GSP:       ${:.2} / ${:.2}", ledger.invariant.glp, ledger.invariant.gsp);
    println!("  7-Pay Premium:   ${:.2}", ledger.invariant.seven_pay_premium);
    if ledger.invariant.is_mec {
        println!(
            "  MEC:             year {} month {}",
            ledger.invariant.mec_year + 1,
            ledger.invariant.mec_month + 1
        );
    }
    if let Some(outcome) = &ledger.solve {
        println!(
            "  Solve:           {:?} = ${:.2} ({:?})",
            outcome.spec.solve_type, outcome.result.root, outcome.result.validity
        );
    }
    if let Some(premium) = ledger.invariant.guar_premium {
        println!("  Guar. Premium:   ${:.2}", premium);
    }
    println!();

    let bases: Vec<Basis> = if cli.all_bases {
        ledger.variants.keys().copied().collect()
    } else {
        vec![Basis::Current]
    };
    for basis in bases {
        let Some(v) = ledger.variant(basis) else {
            continue;
        };
        println!("{} basis (lapse: year {} month {})", basis.label(), v.lapse_year + 1, v.lapse_month + 1);
        println!(
            "{:>4} {:>4} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "Year", "Age", "Premium", "COI", "Interest", "AcctValue", "CSV", "DeathBen"
        );
        println!("{}", "-".repeat(90));
        for t in 0..ledger.len() {
            println!(
                "{:>4} {:>4} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                t + 1,
                cli.issue_age + t,
                ledger.invariant.gross_pmt[t],
                v.coi_charge[t],
                v.int_credited_gen[t] + v.int_credited_sep[t],
                v.acct_value[t],
                v.csv_net[t],
                v.death_benefit[t],
            );
            if t >= v.lapse_year {
                break;
            }
        }
        println!();
    }

    Ok(())
}
