//! `carehive`: command-line front-end for the CareHive session client.
//!
//! Each invocation behaves like one page load: the persisted session is
//! hydrated from `--session-file`, the command runs, and any session change is
//! written back to the same file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use carehive::config::ConfigError;
use carehive::net::transport::{ApiRequest, Method, ReqwestTransport};
use carehive::net::types::RegistrationForm;
use carehive::routes::Route;
use carehive::state::manager::Hydration;
use carehive::state::store::FileStore;
use carehive::util::guard::{self, GuardDecision};
use carehive::util::navigate::HistoryNavigator;
use carehive::{AuthError, ClientConfig, SessionManager};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "carehive", about = "CareHive session client")]
struct Cli {
    /// Backend base URL. Falls back to the client configuration default.
    #[arg(long, env = "CAREHIVE_API_BASE_URL")]
    base_url: Option<String>,

    /// File holding the persisted session.
    #[arg(long, env = "CAREHIVE_SESSION_FILE", default_value = ".carehive-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with email and password.
    Login {
        email: String,
        #[arg(long, env = "CAREHIVE_PASSWORD")]
        password: String,
    },
    /// Drop the persisted session.
    Logout,
    /// Print the logged-in user after verifying it with the backend.
    Whoami,
    /// Create an Elder or Caretaker account.
    Register(RegisterArgs),
    /// Request a password-reset email.
    ForgotPassword { email: String },
    /// Set a new password using a reset token.
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "CAREHIVE_PASSWORD")]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Send an authenticated request and print the response body.
    Request {
        method: String,
        path: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
    },
    /// Show what the route guard decides for a path.
    Route { path: String },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    contact: String,
    #[arg(long, env = "CAREHIVE_PASSWORD")]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    gender: String,
    /// Date of birth, `YYYY-MM-DD`.
    #[arg(long)]
    date: String,
    #[arg(long, default_value = "Elder")]
    user_type: String,
    #[arg(long)]
    emergency_contact: String,
}

impl From<RegisterArgs> for RegistrationForm {
    fn from(args: RegisterArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            contact: args.contact,
            password: args.password,
            confirm_password: args.confirm_password,
            gender: args.gender,
            date: args.date,
            user_type: args.user_type,
            emergency_contact: args.emergency_contact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config = config.with_base_url(url)?;
    }

    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let store = Arc::new(FileStore::new(cli.session_file));
    let navigator = Arc::new(HistoryNavigator::new());
    let manager = SessionManager::new(config, transport, store, navigator.clone());

    if let Hydration::Unverified(reason) = manager.hydrate().await {
        eprintln!("warning: {reason}");
    }

    let result = run(&manager, cli.command).await;
    if let Some(path) = navigator.current() {
        eprintln!("-> {path}");
    }
    result
}

async fn run(manager: &SessionManager, command: Command) -> Result<(), CliError> {
    let api = manager.api();
    match command {
        Command::Login { email, password } => {
            let user = api.login_with_password(&email, &password).await?;
            eprintln!("logged in as {} ({})", user.email, user.user_type);
            let landing = Route::landing_for(&user.user_type);
            println!("{}", landing.path());
            Ok(())
        }
        Command::Logout => {
            manager.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let Some(user) = manager.user() else {
                return Err(CliError::NotLoggedIn);
            };
            print_json(&serde_json::to_value(user)?)
        }
        Command::Register(args) => {
            let user = api.register(&args.into()).await?;
            eprintln!("registered {}; log in to continue", user.email);
            print_json(&serde_json::to_value(user)?)
        }
        Command::ForgotPassword { email } => {
            api.forgot_password(&email).await?;
            println!("Password reset link sent!");
            Ok(())
        }
        Command::ResetPassword { token, password, confirm } => {
            api.reset_password(&token, &password, &confirm).await?;
            println!("Password reset successful!");
            Ok(())
        }
        Command::Request { method, path, data } => {
            let method = Method::parse(&method).ok_or(CliError::UnknownMethod(method))?;
            let mut request = ApiRequest::new(method, path);
            if let Some(data) = data {
                request = request.with_json(serde_json::from_str(&data)?);
            }
            let response = api.request(&request).await?;
            eprintln!("HTTP {}", response.status);
            match serde_json::from_str::<Value>(&response.body) {
                Ok(json) => print_json(&json),
                Err(_) => {
                    println!("{}", response.body);
                    Ok(())
                }
            }
        }
        Command::Route { path } => {
            let route = Route::parse(&path);
            match guard::evaluate(&manager.snapshot(), &route) {
                GuardDecision::Pending => println!("pending"),
                GuardDecision::Render(route) => println!("render {}", route.path()),
                GuardDecision::Redirect(target) => println!("redirect {}", target.path()),
            }
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
