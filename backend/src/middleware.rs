/// CORS policy: only the configured origins may call the API with credentials.
pub fn cors(allowed_origins: &[String]) -> warp::cors::Builder {
    warp::cors()
        .allow_origins(allowed_origins.iter().map(String::as_str))
        .allow_credentials(true)
        .allow_headers(vec!["Content-Type", "Authorization", "Accept"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
}
