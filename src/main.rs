use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use tracing::error;
use tracing_subscriber::EnvFilter;

use loan_calc::api::{self, AffordArgs, LoanArgs, OutputFormat};

/// Simple-interest and amortizing loan calculator
#[derive(Parser, Debug)]
#[command(
    name = "loan-calc",
    version,
    about = "Loan calculator: total interest, total cost, monthly payment and amortization schedule"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Total interest, total cost and monthly payment for a loan
    Quote {
        #[command(flatten)]
        loan: LoanArgs,
        /// Append the month-by-month schedule
        #[arg(long)]
        schedule: bool,
    },
    /// Principal a desired monthly payment supports
    Afford(AffordArgs),
    /// Month-by-month amortization schedule
    Schedule(LoanArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "LOAN_CALC_PORT", default_value_t = 8080)]
        port: u16,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Quote { loan, schedule } => api::run_quote_command(loan, schedule, cli.output),
        Commands::Afford(args) => api::run_afford_command(args, cli.output),
        Commands::Schedule(args) => api::run_schedule_command(args, cli.output),
        Commands::Serve { host, port } => {
            if let Err(e) = api::run_http_server(SocketAddr::new(host, port)).await {
                error!("server error: {e}");
                std::process::exit(1);
            }
            return;
        }
    };

    match result {
        Ok(out) => println!("{out}"),
        Err(msg) => {
            eprintln!("Error: {msg}");
            std::process::exit(1);
        }
    }
}
