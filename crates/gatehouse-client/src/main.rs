//! Gatehouse CLI - Command-line client
//!
//! Usage:
//!   gatehouse register --email <email> --password <password>
//!   gatehouse login --email <email> --password <password>
//!   gatehouse whoami
//!   gatehouse open <path>
//!   gatehouse logout

use clap::{Parser, Subcommand};
use gatehouse_client::{
    FileStorage, HttpAuthApi, Navigation, Navigator, RegisterForm, RouteGuard, Session,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse authentication client")]
#[command(version)]
struct Cli {
    /// Base URL of the Gatehouse API
    #[arg(long, env = "GATEHOUSE_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// File holding the cached session
    #[arg(long, env = "GATEHOUSE_SESSION_FILE", default_value = ".gatehouse-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GATEHOUSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GATEHOUSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the cached session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Resolve a view path against the current session
    Open {
        /// View path, e.g. /chat
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = Arc::new(HttpAuthApi::new(cli.api_url));
    let storage = Arc::new(FileStorage::new(cli.session_file));
    let mut session = Session::restore(api, storage)?;

    match cli.command {
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let form = RegisterForm {
                first_name,
                last_name,
                email,
                password,
            };
            let user = session.register(&form).await?;
            println!("Registered and signed in as {} ({})", user.display_name(), user.role);
        }
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("Signed in as {} ({})", user.display_name(), user.role);
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Commands::Whoami => match session.user() {
            Some(user) => {
                println!("{}", user.display_name());
                println!("  id:    {}", user.id);
                println!("  email: {}", user.email);
                println!("  role:  {}", user.role);
            }
            None => println!("Not signed in"),
        },
        Commands::Open { path } => {
            let mut navigator = Navigator::new(RouteGuard::default(), session.subscribe());
            match navigator.navigate(&path) {
                Navigation::Render(path) => println!("{path}"),
                Navigation::Redirect(to) => println!("Not signed in; redirected to {to}"),
            }
        }
    }

    Ok(())
}
