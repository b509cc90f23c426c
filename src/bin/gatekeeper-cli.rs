use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use signup_gatekeeper::config::load_effective;

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Operator tool for the signup gatekeeper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file (with environment overrides) and print the result
    CheckConfig {
        path: PathBuf,
    },
    /// Submit a signup through a running gatekeeper
    Signup {
        #[arg(short, long, default_value = "http://localhost:8080/")]
        url: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        /// Challenge token, sent as `captcha`
        #[arg(long)]
        captcha: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => match load_effective(Some(&path)) {
            Ok(mut config) => {
                if !config.challenge.secret.is_empty() {
                    config.challenge.secret = "<redacted>".to_string();
                }
                println!("{}", toml::to_string_pretty(&config)?);
                if config.backend.url.is_none() {
                    eprintln!("Warning: backend.url is not set; signups will fail with 500");
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Signup {
            url,
            email,
            password,
            name,
            captcha,
        } => {
            let mut body = json!({ "email": email, "password": password, "name": name });
            if let Some(token) = captcha {
                body["captcha"] = json!(token);
            }

            let res = reqwest::Client::new().post(&url).json(&body).send().await?;
            let status = res.status();
            let text = res.text().await?;
            println!("{}", status);
            if !text.is_empty() {
                println!("{}", text);
            }
            Ok(if status.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
