//! Goal planner CLI
//!
//! Runs the planning API server or evaluates a single request from the
//! command line.

use clap::{Parser, Subcommand};
use goal_planner::{
    config::Config,
    inflation::{self, GoalCategory},
    planner::{PlanRequest, Planner},
    server::{self, AppState},
    stats::SnapshotStore,
    types::{AssetClass, InvestmentType, RiskProfile, TimeHorizon},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "goal-planner")]
#[command(about = "Inflation-aware goal planning and portfolio allocation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the planning API server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Evaluate a single planning request
    Plan {
        /// Inflation-adjusted goal amount
        #[arg(long)]
        goal: f64,
        /// Investment horizon in years
        #[arg(long)]
        years: f64,
        /// Risk profile: low, medium, high
        #[arg(long, default_value = "medium")]
        risk: String,
        /// Time horizon: short, medium, long
        #[arg(long, default_value = "medium")]
        horizon: String,
        /// Investment type: sip or lumpsum
        #[arg(long, default_value = "sip")]
        investment_type: String,
        /// Upfront amount on hand (lumpsum requests)
        #[arg(long)]
        lumpsum_available: Option<f64>,
    },
    /// Project a present-day cost to its inflated future value
    Project {
        /// Present-day cost
        #[arg(long)]
        amount: f64,
        /// Horizon in years
        #[arg(long)]
        years: f64,
        /// Goal category: gold, real_estate, car, education, other
        #[arg(long, default_value = "other")]
        category: String,
        /// Explicit annual inflation rate, overrides the category table
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Show the goal-category inflation table
    Rates,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { port } => run_server(config, port).await,
        Commands::Plan {
            goal,
            years,
            risk,
            horizon,
            investment_type,
            lumpsum_available,
        } => run_plan(config, goal, years, &risk, &horizon, &investment_type, lumpsum_available),
        Commands::Project { amount, years, category, rate } => {
            run_project(amount, years, &category, rate)
        }
        Commands::Rates => {
            print_rates();
            Ok(())
        }
    }
}

fn build_planner(config: &Config) -> anyhow::Result<Planner> {
    let store = Arc::new(SnapshotStore::new(config.initial_snapshot()?));
    Ok(Planner::new(config.policy.to_policy(), store))
}

async fn run_server(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let planner = build_planner(&config)?;
    let state = Arc::new(AppState { planner });
    let port = port.unwrap_or(config.server.port);
    server::serve(state, &config.server.host, port).await
}

fn run_plan(
    config: Config,
    goal: f64,
    years: f64,
    risk: &str,
    horizon: &str,
    investment_type: &str,
    lumpsum_available: Option<f64>,
) -> anyhow::Result<()> {
    let request = PlanRequest {
        goal_future_value: goal,
        years,
        risk_profile: risk.parse::<RiskProfile>().map_err(anyhow::Error::msg)?,
        time_horizon: horizon.parse::<TimeHorizon>().map_err(anyhow::Error::msg)?,
        investment_type: investment_type
            .parse::<InvestmentType>()
            .map_err(anyhow::Error::msg)?,
        current_price: None,
        lumpsum_available,
        goal_category: None,
    };

    let planner = build_planner(&config)?;
    let response = planner.plan(&request)?;

    println!("\nRecommended allocation ({}):\n", response.optimization_status);
    for asset in AssetClass::ALL {
        let weight = response.portfolio.get(asset.name()).copied().unwrap_or(0.0);
        println!("  {:<8} {:>6.2}%", asset.name(), weight * 100.0);
    }
    println!("\nExpected return: {:.2}%", response.expected_return * 100.0);
    println!("Portfolio risk:  {:.2}%", response.portfolio_risk * 100.0);

    if let Some(monthly) = response.monthly_amount {
        println!("Monthly SIP:     {monthly}");
    }
    if let Some(lumpsum) = response.lumpsum_amount {
        println!("Lumpsum now:     {lumpsum}");
    }
    if let Some(supplemental) = response.supplemental_monthly {
        println!("Supplemental:    {supplemental} monthly (hybrid plan)");
    }
    println!("Total invested:  {}", response.total_invested);
    println!("\n{}", response.message);
    Ok(())
}

fn run_project(amount: f64, years: f64, category: &str, rate: Option<f64>) -> anyhow::Result<()> {
    let category = category.parse::<GoalCategory>().map_err(anyhow::Error::msg)?;
    let rate = rate.unwrap_or_else(|| category.annual_rate());
    let months = (years * 12.0).round() as u32;
    let projection = inflation::project_over_months(amount, rate, months)?;

    println!("\nCost today:     {:.2}", projection.current_value);
    println!("Cost in {:.1}y:   {:.2}", projection.years, projection.future_value);
    println!("Inflation rate: {:.2}% ({category})", projection.annual_rate * 100.0);
    println!("Total increase: {:.2}%", projection.total_inflation_pct);
    Ok(())
}

fn print_rates() {
    println!("\nGoal-category inflation rates (annual CAGR):\n");
    for category in GoalCategory::ALL {
        println!("  {:<12} {:>6.2}%", category.name(), category.annual_rate() * 100.0);
    }
}
