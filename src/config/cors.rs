use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let parsed = parse_origins(origins);

    if parsed.is_empty() {
        // Credentials are allowed, so a wildcard origin would be rejected by tower-http.
        tracing::warn!("CORS: No valid origins configured, mirroring request origin for development");
        AllowOrigin::mirror_request()
    } else {
        tracing::info!("CORS: Configured with {} allowed origin(s)", parsed.len());
        AllowOrigin::list(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ALLOWED_ORIGINS;

    #[test]
    fn test_create_cors_layer() {
        let _layer = create_cors_layer(&["http://localhost:5173".to_string()]);
        let _empty = create_cors_layer(&[]);
    }

    #[test]
    fn test_default_origins_are_valid() {
        let defaults: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .split(',')
            .map(String::from)
            .collect();
        assert_eq!(parse_origins(&defaults).len(), defaults.len());
    }

    #[test]
    fn test_invalid_origins_are_skipped() {
        let origins = vec!["http://ok.example.com".to_string(), "bad\norigin".to_string()];
        assert_eq!(parse_origins(&origins).len(), 1);
    }
}
