//! `navctl`: inspect navigation config from the command line.
//!
//! Usage:
//!   navctl -c nav.toml resolve <target> --from <path> [--scope auto]
//!   navctl -c nav.toml check <path> [--user <id>]
//!   navctl -c nav.toml redirect <module> <kind> --site <site>
//!   navctl -c nav.toml menu <menu.json> --from <path> [--scope auto]
//!
//! Results are printed as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use openerp_nav::{AccessContext, NavConfig, RedirectKind, Scope, User};
use tracing::info;

/// Navigation config inspector.
#[derive(Parser, Debug)]
#[command(name = "navctl", about = "Resolve routes and check access against a navigation config")]
struct Cli {
    /// Path to the navigation config (TOML).
    #[arg(short = 'c', long = "config", required = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a link target against the current path.
    Resolve {
        target: String,
        /// Current page path.
        #[arg(long = "from", default_value = "/")]
        from: String,
        #[arg(long, default_value = "auto")]
        scope: Scope,
    },
    /// Check whether a user may open a concrete path.
    Check {
        /// Treated as site-absolute: `acme/marketing` is checked as
        /// `/acme/marketing`.
        path: String,
        /// User id; omitted means anonymous.
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the configured redirect of a module.
    Redirect {
        module: String,
        kind: RedirectKind,
        #[arg(long)]
        site: String,
    },
    /// Normalize a JSON menu file for the given page.
    Menu {
        file: PathBuf,
        #[arg(long = "from", default_value = "/")]
        from: String,
        #[arg(long, default_value = "auto")]
        scope: Scope,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Loading navigation config from {}", cli.config.display());
    let ctx = NavConfig::load(&cli.config)
        .and_then(NavConfig::into_context)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let output = match cli.command {
        Command::Resolve { target, from, scope } => {
            serde_json::json!({ "path": ctx.resolve_route(&target, &from, scope) })
        }
        Command::Check { path, user } => {
            let user = user.map(User::new);
            let outcome = ctx.check_navigation(&path, "/", Scope::Absolute, user.as_ref(), &AccessContext::new().with_path(&path));
            serde_json::to_value(outcome)?
        }
        Command::Redirect { module, kind, site } => {
            serde_json::json!({ "path": ctx.get_redirect_route(&module, kind, &site) })
        }
        Command::Menu { file, from, scope } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let items: Vec<serde_json::Value> = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON array", file.display()))?;
            serde_json::to_value(ctx.normalize_menu(&items, scope, &from))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
