use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ngx-cli")]
#[command(about = "Management CLI for the nginx config agent", long_about = None)]
struct Cli {
    #[arg(short, long, env = "NGX_AGENT_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List config files and their content
    List,
    /// Print one config file
    Show { filename: String },
    /// Upload a new config file from a local path
    Create { filename: String, file: PathBuf },
    /// Replace an existing config file with a local file
    Update { filename: String, file: PathBuf },
    /// Delete a config file
    Delete { filename: String },
    /// Agent status
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = |segments: &[&str]| endpoint(&cli.url, segments);

    let res = match &cli.command {
        Commands::List => client.get(url(&["configs"])?).send().await?,
        Commands::Show { filename } => client.get(url(&["configs", filename.as_str()])?).send().await?,
        Commands::Create { filename, file } => {
            let content = std::fs::read_to_string(file)?;
            client
                .post(url(&["configs", filename.as_str()])?)
                .form(&[("content", content)])
                .send()
                .await?
        }
        Commands::Update { filename, file } => {
            let content = std::fs::read_to_string(file)?;
            client
                .put(url(&["configs", filename.as_str()])?)
                .form(&[("content", content)])
                .send()
                .await?
        }
        Commands::Delete { filename } => client.delete(url(&["configs", filename.as_str()])?).send().await?,
        Commands::Status => client.get(url(&["health"])?).send().await?,
    };

    print_response(res).await
}

/// `{base}/api/ngx/{segments..}`, each segment percent-encoded so a filename
/// cannot change the route.
fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, Box<dyn std::error::Error>> {
    let mut url = reqwest::Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(["api", "ngx"])
        .extend(segments);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: agent returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(ExitCode::FAILURE);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(ExitCode::SUCCESS)
}
