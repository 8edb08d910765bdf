//! Options Paper Desk Server
//!
//! REST API server for paper-trading listed options against delayed quotes.

use options_paper_desk::api::create_router;
use options_paper_desk::config::Config;
use options_paper_desk::secrets::EnvSecretStore;
use options_paper_desk::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use options_paper_desk::models::{
    ChainResponse, ContractQuote, Fill, HealthResponse, HeartbeatStatus, MonitorStatusResponse,
    OptionRight, OptionSpec, OrderListResponse, OrderPlacement, OrderRequest, OrderSide,
    OrderStatus, PlaceOrderResponse, PlacedOrder, PlacementStatus, ProviderStatusResponse,
    QuoteResponse, RemovedResponse, SavedOrder, TimeInForce,
};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        options_paper_desk::api::handlers::health_check,
        options_paper_desk::api::handlers::get_quote,
        options_paper_desk::api::handlers::get_chain,
        options_paper_desk::api::handlers::get_provider_status,
        options_paper_desk::api::handlers::place_order,
        options_paper_desk::api::handlers::list_orders,
        options_paper_desk::api::handlers::get_order,
        options_paper_desk::api::handlers::delete_order,
        options_paper_desk::api::handlers::clear_orders,
        options_paper_desk::api::handlers::get_monitor,
        options_paper_desk::api::handlers::start_monitor,
        options_paper_desk::api::handlers::stop_monitor,
        options_paper_desk::api::websocket::ws_handler,
    ),
    components(
        schemas(
            HealthResponse,
            HeartbeatStatus,
            QuoteResponse,
            ChainResponse,
            ContractQuote,
            ProviderStatusResponse,
            OrderRequest,
            OptionSpec,
            OptionRight,
            OrderSide,
            TimeInForce,
            OrderStatus,
            OrderPlacement,
            PlacedOrder,
            PlacementStatus,
            Fill,
            SavedOrder,
            PlaceOrderResponse,
            OrderListResponse,
            RemovedResponse,
            MonitorStatusResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Quotes", description = "Delayed prices and option chains"),
        (name = "Orders", description = "Paper order placement and ledger"),
        (name = "Monitor", description = "Working-order monitor control"),
        (name = "WebSocket", description = "Ledger change stream"),
    ),
    info(
        title = "Options Paper Desk API",
        version = "0.1.0",
        description = "REST API for paper-trading listed options against delayed quotes",
        license(name = "MIT"),
        contact(name = "Joaquin Bejar", email = "jb@taunais.com")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (DESK_CONFIG, HOST and PORT)
    let config = Config::from_env()?;
    let host = config.server.host.clone();
    let port = config.server.port;
    let autostart = config.monitor.autostart;

    // Create application state
    let state = Arc::new(AppState::from_config(config, &EnvSecretStore)?);
    match state.quotes.provider_name() {
        Some(name) => info!("Quote provider: {}", name),
        None => info!("No quote provider configured, using public sources"),
    }

    if autostart {
        state.monitor.start();
    }

    info!("Starting Options Paper Desk on {}:{}", host, port);
    info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = create_router(Arc::clone(&state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    state.monitor.stop();
    Ok(())
}
