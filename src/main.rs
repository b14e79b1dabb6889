use insight_client::{AppError, ClientConfig, InsightClient};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "insight", about = "Command line client for the Insight API", version)]
struct Cli {
    /// API base URL (overrides API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Credentials {
    #[arg(long, short = 'e')]
    email: String,

    #[arg(long, short = 'p')]
    password: String,
}

#[derive(Parser)]
enum Command {
    /// Log in and show the session expiry
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Create an account
    Register {
        #[command(flatten)]
        credentials: Credentials,

        /// Password confirmation
        #[arg(long)]
        confirm: String,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(long, short = 'e')]
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword {
        #[arg(long)]
        token: Option<String>,

        #[arg(long, short = 'p')]
        password: String,

        #[arg(long)]
        confirm: String,
    },

    /// Print preview data as JSON, logging in first if credentials are given
    Preview {
        #[arg(long, short = 'e', requires = "password")]
        email: Option<String>,

        #[arg(long, short = 'p', requires = "email")]
        password: Option<String>,
    },

    /// Check whether an account has purchased access
    VerifyAccess {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Create an account and payment intent, printing the client secret
    PreparePayment {
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insight_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.api_url.as_deref() {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    }
    .context("Failed to load client configuration")?;

    info!(base_url = %config.base_url, "Using Insight API");
    let client = InsightClient::from_config(&config).context("Failed to create API client")?;

    run(&client, cli.command).await.map_err(describe)
}

async fn run(client: &InsightClient, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login { credentials } => {
            let snapshot = client
                .login(&credentials.email, &credentials.password)
                .await?;
            match snapshot.expiry {
                Some(expiry) => println!("Logged in. Session expires at {}", expiry.to_rfc3339()),
                None => println!("Logged in."),
            }
        }
        Command::Register {
            credentials,
            confirm,
        } => {
            client
                .register(&credentials.email, &credentials.password, &confirm)
                .await?;
            println!("Account created. You can now log in.");
        }
        Command::ForgotPassword { email } => {
            println!("{}", client.forgot_password(&email).await?);
        }
        Command::ResetPassword {
            token,
            password,
            confirm,
        } => {
            let message = client
                .reset_password(token.as_deref(), &password, &confirm)
                .await?;
            println!("{}", message);
        }
        Command::Preview { email, password } => {
            if let (Some(email), Some(password)) = (email, password) {
                client.login(&email, &password).await?;
            }
            let rows = client.preview_data().await?;
            let output = serde_json::to_string_pretty(&rows)
                .map_err(|e| AppError::InvalidResponse(e.to_string()))?;
            println!("{}", output);
        }
        Command::VerifyAccess { credentials } => {
            client
                .login(&credentials.email, &credentials.password)
                .await?;
            if client.verify_access().await? {
                println!("Access granted.");
            } else {
                println!("No access. Purchase lifetime access to view the full data.");
            }
        }
        Command::PreparePayment { credentials } => {
            let secret = client
                .prepare_payment(&credentials.email, &credentials.password)
                .await?;
            println!("{}", secret.as_str());
        }
    }

    client.logout();
    Ok(())
}

/// Turns an `AppError` into the text a user should see
fn describe(error: AppError) -> anyhow::Error {
    match error.user_message() {
        Some(message) => anyhow::anyhow!(message),
        None => anyhow::anyhow!("Your session has expired. Please log in again."),
    }
}
