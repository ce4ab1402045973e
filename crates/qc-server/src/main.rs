use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod checklist;
mod config;
mod error;
mod models;
mod routes;
mod shipments;
mod units;
mod users;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = config::load().context("loading configuration")?;
    init_tracing(&config.tracing);
    let store = qc_db::create(&config.database)
        .await
        .context("creating database store")?;
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&store, admin)
            .await
            .context("creating bootstrap administrator")?;
    }
    let cors = routes::cors_layer(config.cors_origin.as_deref()).context("configuring CORS")?;
    let app_state = AppState {
        store,
        token_keys: Arc::new(auth::TokenKeys::new(
            &config.jwt_secret,
            config.token_lifetime,
        )),
    };
    let app = routes::setup(app_state, cors);
    let bind_to = format!("{}:{}", config.bind_address, config.bind_port);
    let listener = tokio::net::TcpListener::bind(&bind_to)
        .await
        .with_context(|| format!("binding listener to {bind_to}"))?;
    tracing::info!("listening on {bind_to}");

    let cancellation_token = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancellation_token.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await
        .context("serving application")?;
    tracing::info!("shut down");
    Ok(())
}

#[derive(Clone)]
struct AppState {
    store: qc_db::Store,
    token_keys: Arc<auth::TokenKeys>,
}

fn init_tracing(config: &config::TracingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());
    if config.console {
        registry.with(console_subscriber::spawn()).init();
    } else {
        registry.init();
    }
}

async fn cancel_on_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("unable to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => (),
        _ = terminate => (),
    }
    tracing::info!("shutdown requested");
    cancellation_token.cancel();
}

#[tracing::instrument(skip_all, fields(username = %admin.username))]
async fn bootstrap_admin(
    store: &qc_db::Store,
    admin: &config::BootstrapAdmin,
) -> anyhow::Result<()> {
    if store.any_admin_exists().await? {
        tracing::debug!("administrator already present");
        return Ok(());
    }
    let password_hash = auth::hash_password(admin.password.clone()).await?;
    match store
        .create_user(qc_db::models::NewUser {
            username: admin.username.clone(),
            password_hash,
            role: qc_db::types::Role::Admin.as_str().to_owned(),
        })
        .await
    {
        Ok(_) => tracing::info!("bootstrap administrator created"),
        Err(qc_db::Error::Conflict(qc_db::UniqueField::Username)) => {
            tracing::warn!("bootstrap username is taken by a non-administrator; left unchanged")
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
