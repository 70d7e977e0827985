use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use apollo_proxy::models::user::{NewUser, UserView};
use apollo_proxy::store::memory::MemoryStore;
use apollo_proxy::store::postgres::PgStore;
use apollo_proxy::store::UserStore;
use apollo_proxy::{app, cli, config, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, in_memory }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port, in_memory).await
        }
        Some(cli::Commands::User { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            let state = AppState::new(cfg, Arc::new(db))?;
            handle_user_command(command, &state).await
        }
        Some(cli::Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port, false).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() {
    // Export spans over OTLP when OTEL_EXPORTER_OTLP_ENDPOINT is set.
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "apollo-proxy"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
        {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!("failed to install OpenTelemetry tracer: {}", e);
                None
            }
        }
    } else {
        None
    };

    let json_logs = std::env::var("APOLLO_PROXY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "apollo_proxy=debug,tower_http=debug".into()),
        ))
        .with(fmt_layer)
        .with(telemetry_layer)
        .init();
}

async fn run_server(cfg: config::Config, port: u16, in_memory: bool) -> anyhow::Result<()> {
    let store: Arc<dyn UserStore> = if in_memory {
        tracing::warn!("Using in-memory user store, users are lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;

        tracing::info!("Running migrations...");
        db.migrate().await?;
        Arc::new(db)
    };

    url::Url::parse(&cfg.upstream_url)
        .with_context(|| format!("invalid APOLLO_UPSTREAM_URL: {}", cfg.upstream_url))?;

    let state = Arc::new(AppState::new(cfg, store)?);

    if state.validator.cache().is_enabled() {
        jobs::cleanup::spawn(state.validator.cache().clone());
        tracing::info!(
            ttl_secs = state.config.key_check_ttl_secs,
            "Key liveness verdicts are cached"
        );
    } else {
        tracing::info!("Key liveness is checked upstream on every protected request");
    }

    let router = app(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        upstream = %state.config.upstream_url,
        "apollo-proxy listening on {}",
        addr
    );
    axum::serve(listener, router).await?;

    Ok(())
}

async fn handle_user_command(cmd: cli::UserCommands, state: &AppState) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::Add { email, api_key } => {
            let new_user = NewUser { email, api_key };
            match state.store.insert_user(&new_user).await? {
                Some(user) => {
                    println!("User registered:");
                    println!("  ID:      {}", user.id);
                    println!("  Email:   {}", user.email);
                    println!("  API key: {}", user.api_key_hint());
                }
                None => anyhow::bail!("email '{}' is already registered", new_user.email),
            }
        }
        cli::UserCommands::List => {
            let users = state.store.list_users().await?;
            if users.is_empty() {
                println!("No users registered.");
                return Ok(());
            }
            println!(
                "{:<8} {:<32} {:<12} {:<8} LAST CHECKED",
                "ID", "EMAIL", "API KEY", "ACTIVE"
            );
            for u in users.iter().map(UserView::from) {
                println!(
                    "{:<8} {:<32} {:<12} {:<8} {}",
                    u.id,
                    u.email,
                    u.api_key_hint,
                    u.is_active,
                    u.last_checked.format("%Y-%m-%d %H:%M")
                );
            }
        }
        cli::UserCommands::Check { email } => {
            let user = state
                .store
                .find_by_email(&email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user not found: {}", email))?;
            let active = state.validator.check(&user).await?;
            if active {
                println!("API key for {} is live.", email);
            } else {
                println!("API key for {} has been expired.", email);
            }
        }
        cli::UserCommands::SetKey { email, api_key } => {
            let user = state
                .store
                .find_by_email(&email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user not found: {}", email))?;
            state.store.update_api_key(user.id, &api_key).await?;
            println!("API key updated for {}.", email);
        }
    }
    Ok(())
}
