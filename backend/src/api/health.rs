use warp::Reply;

use crate::models::HealthResponse;

pub async fn handle_health() -> Result<impl Reply, std::convert::Infallible> {
    Ok(warp::reply::json(&HealthResponse {
        status: "ok",
        message: "Backend is running",
    }))
}
