//! HTTP transport: GraphQL over POST, subscriptions over WebSocket, plus health probes.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use tracing::info;
use tracing_actix_web::TracingLogger;

async fn graphql_handler(state: web::Data<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

async fn graphql_subscription_handler(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    GraphQLSubscription::new(state.schema.clone()).start(&req, payload)
}

async fn playground_handler(state: web::Data<AppState>) -> HttpResponse {
    let path = state.config.graphql_path.as_str();
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(
            GraphiQLSource::build()
                .endpoint(path)
                .subscription_endpoint(path)
                .finish(),
        )
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn ready_handler(state: web::Data<AppState>) -> Result<&'static str, AppError> {
    state.service.ping_store().await?;
    Ok("ready")
}

/// Mount every route; shared by the real server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig, state: AppState) {
    let graphql_path = state.config.graphql_path.clone();

    cfg.app_data(web::Data::new(state))
        .route(&graphql_path, web::post().to(graphql_handler))
        .route(&graphql_path, web::get().to(graphql_subscription_handler))
        .route("/playground", web::get().to(playground_handler))
        .route("/health", web::get().to(health_handler))
        .route("/ready", web::get().to(ready_handler));
}

pub async fn run(state: AppState) -> AppResult<()> {
    let bind_addr = state.config.bind_addr();
    info!(%bind_addr, graphql_path = %state.config.graphql_path, "starting chat-service");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let state = state.clone();
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(move |cfg| configure(cfg, state))
    })
    .bind(&bind_addr)
    .map_err(|e| AppError::StartServer(format!("bind {bind_addr}: {e}")))?
    .run()
    .await
    .map_err(|e| AppError::StartServer(format!("HTTP server: {e}")))
}
