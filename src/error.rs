#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum FaerscopeError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::FaerscopeError;

    #[test]
    fn api_error_display_includes_api_name() {
        let err = FaerscopeError::Api {
            api: "openfda".to_string(),
            message: "HTTP 500".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("openfda"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn invalid_argument_display_keeps_message() {
        let err = FaerscopeError::InvalidArgument("name must be between 2 and 100 characters".into());
        assert!(
            err.to_string()
                .contains("name must be between 2 and 100 characters")
        );
    }
}
