use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use taskdeck_server::api;
use taskdeck_server::app_state::AppState;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "taskdeckd: task tracker REST API",
    long_about = None
)]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, default_value = "taskdeck.sqlite3")]
    db: PathBuf,

    /// Socket address to bind.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "taskdeck_core=debug,taskdeck_server=debug,info"
        } else {
            "taskdeck_core=info,taskdeck_server=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let conn = taskdeck_core::db::open(&cli.db)
        .with_context(|| format!("open database {}", cli.db.display()))?;
    let state = web::Data::new(AppState::new(conn));

    info!(db = %cli.db.display(), bind = %cli.bind, "starting taskdeckd");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::NormalizePath::trim())
            .configure(api::configure)
    })
    .bind(&cli.bind)
    .with_context(|| format!("bind {}", cli.bind))?
    .run()
    .await
    .context("run http server")
}
