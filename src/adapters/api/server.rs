use crate::adapters::api::handlers::ws::subscribe_ws;
use crate::adapters::api::handlers::{aggregates::get_aggregates, health_check};
use crate::core::ports::store::AggregateStorePort;
use crate::messaging::fanout::FanoutManager;
use crate::metrics::{HealthCheck, HealthCheckReporting, HealthReporting};
use crate::utils::error::{AggregatorError, AggregatorResult};
use actix_web::{middleware, web, App, HttpServer};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type HealthReporter = Arc<dyn HealthCheckReporting>;

/// Shared API state.
pub struct ApiState {
    pub store: Arc<dyn AggregateStorePort>,
}

/// Launches the actix-web API server with logging and endpoint registration.
///
/// This function creates and runs an HTTP server that listens on the specified
/// host and port. It registers the health check, the aggregate snapshot
/// endpoint, and the WebSocket subscription endpoint. The call resolves when
/// the server exits (normally at process shutdown).
///
/// # Arguments
///
/// * `host` - The IP address on which the server should listen.
/// * `port` - The port on which the server should accept connections.
/// * `store` - The aggregate store backing the snapshot endpoint and the
///   connect-time summary of new subscriptions.
/// * `health_reporter` - An Arc-wrapped reference to a type implementing both
///   `HealthCheck` and `HealthReporting`.
/// * `fanout` - The fan-out manager new WebSocket connections attach to.
/// * `shutdown_token` - The process shutdown token; every connection's
///   cancellation signal is a child of it, so shutdown tears all
///   subscriptions down.
pub async fn launch_api_server<P>(
    host: Ipv4Addr,
    port: u16,
    store: Arc<dyn AggregateStorePort>,
    health_reporter: Arc<P>,
    fanout: FanoutManager,
    shutdown_token: CancellationToken,
) -> AggregatorResult<()>
where
    P: HealthCheck + HealthReporting + 'static,
{
    let state = Arc::new(ApiState { store });

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::new(
                middleware::TrailingSlash::Trim,
            ))
            .wrap(middleware::DefaultHeaders::new().add(("X-Version", "1.0")))
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(health_reporter.clone() as HealthReporter))
            .app_data(web::Data::new(fanout.clone()))
            .app_data(web::Data::new(shutdown_token.clone()))
            .service(health_check)
            .service(get_aggregates)
            .service(subscribe_ws)
    })
    .bind((host, port))
    .map_err(|e| AggregatorError::ApiError(e.to_string()))?
    .run()
    .await
    .map_err(|e| AggregatorError::ApiError(e.to_string()))?;

    Ok(())
}
