use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "healthctl")]
#[command(about = "Query a running health monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "HEALTH_MONITOR_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every dependency
    Check,
    /// Probe a single dependency (database, redis, stripe, paypal, email)
    Service { name: String },
    /// Show circuit breaker state
    Breakers,
    /// Check that the monitor process is up
    Live,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let path = match &cli.command {
        Commands::Check => "/health".to_string(),
        Commands::Service { name } => format!("/health/services/{}", name),
        Commands::Breakers => "/health/breakers".to_string(),
        Commands::Live => "/live".to_string(),
    };

    let res = client.get(format!("{}{}", base, path)).send().await?;
    let healthy = print_response(res).await?;
    if !healthy {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the body. Returns false when the monitor reported a failure.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Monitor returned status {}", status);
        return Ok(false);
    }
    Ok(true)
}
