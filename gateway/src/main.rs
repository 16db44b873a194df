//! Calc Gateway
//!
//! HTTP front for the fiber calculators. Stateless: every POST is
//! evaluated on its own and nothing is stored between requests.

use anyhow::Result;
use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fiber_calc::EvalConfig;

mod routes;

use routes::CalcState;

const DEFAULT_PORT: &str = "18620";

/// Startup settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub port: String,
    pub strict_link_budget: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("CALC_GATEWAY_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        let strict_link_budget = lookup("CALC_STRICT_LINK_BUDGET")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            port,
            strict_link_budget,
        }
    }
}

pub fn app(state: CalcState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", routes::calculator_router(state))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "calc_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    let state = CalcState {
        eval: EvalConfig {
            strict_link_budget: config.strict_link_budget,
        },
    };

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Calc Gateway starting on {}", addr);
    if config.strict_link_budget {
        tracing::info!("   Link budget: strict field validation");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "calc-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
