use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use config_editor::form::{ControlNode, FormField};
use config_editor::http::SubmitRequest;

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Command-line client for the configuration editor API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token, when the service requires one.
    #[arg(short, long, env = "CONFIG_EDITOR_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show store status
    Status,
    /// Show the control tree of a section (`.` for the whole tree)
    Show { section: String },
    /// Edit fields of a section, e.g. `set ui ui.theme=dark` or
    /// `set . ui.theme=dark debug.enabled=true`
    Set {
        section: String,
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
    /// Remove all user configuration and restart
    Clear,
    /// List recent notices
    Notices {
        #[arg(long)]
        since: Option<u64>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(path, value)| (path.trim().to_string(), value.to_string()))
        .filter(|(path, _)| !path.is_empty())
        .ok_or_else(|| format!("expected <path>=<value>, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/api/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Show { section } => {
            let res = client
                .get(config_url(&cli.url, &section))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Set {
            section,
            assignments,
        } => {
            let res = client
                .get(config_url(&cli.url, &section))
                .headers(headers.clone())
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            let tree: ControlNode = res.json().await?;
            let fields = apply_assignments(tree.to_form_fields(), &assignments);
            let res = client
                .post(config_url(&cli.url, &section))
                .headers(headers)
                .json(&SubmitRequest { fields })
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Clear => {
            let res = client
                .delete(format!("{}/api/config", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Notices { since } => {
            let mut request = client.get(format!("{}/api/notices", cli.url)).headers(headers);
            if let Some(since) = since {
                request = request.query(&[("since", since)]);
            }
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

fn config_url(base: &str, section: &str) -> String {
    match section {
        "" | "." => format!("{}/api/config", base),
        section => format!("{}/api/config/{}", base, section),
    }
}

/// Override the named fields; unknown paths are added as text fields.
fn apply_assignments(mut fields: Vec<FormField>, assignments: &[(String, String)]) -> Vec<FormField> {
    for (path, value) in assignments {
        match fields.iter_mut().find(|f| &f.path == path) {
            Some(field) if field.is_checkbox => field.checked = value.trim() == "true",
            Some(field) => field.raw_value = value.clone(),
            None => fields.push(FormField::text(path.as_str(), value.as_str())),
        }
    }
    fields
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
