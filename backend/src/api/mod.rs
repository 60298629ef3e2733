use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use warp::{Filter, Rejection, Reply};

use crate::coach::PlanResolver;
use crate::error::handle_rejection;
use crate::middleware;

mod health;
mod plan;

/// Largest accepted intake payload.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn routes(
    resolver: Arc<PlanResolver>,
    shutdown: CancellationToken,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api");

    let health_route = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health::handle_health);

    let plan_route = api
        .and(warp::path("generate-plan"))
        .and(warp::path::end())
        .and(warp::post())
        .and(limited_body())
        .and(with_resolver(resolver))
        .and(with_shutdown(shutdown))
        .and_then(plan::handle_generate_plan);

    health_route.or(plan_route)
}

/// Full HTTP surface: routes plus error mapping, access log and CORS.
pub fn service(
    resolver: Arc<PlanResolver>,
    shutdown: CancellationToken,
    allowed_origins: &[String],
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    routes(resolver, shutdown)
        .recover(handle_rejection)
        .with(warp::log("api"))
        .with(middleware::cors(allowed_origins))
}

fn limited_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::stream().and_then(|stream| async move {
        plan::collect_body(stream, MAX_BODY_BYTES)
            .await
            .map_err(warp::reject::custom)
    })
}

fn with_resolver(
    resolver: Arc<PlanResolver>,
) -> impl Filter<Extract = (Arc<PlanResolver>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || resolver.clone())
}

fn with_shutdown(
    shutdown: CancellationToken,
) -> impl Filter<Extract = (CancellationToken,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || shutdown.clone())
}
