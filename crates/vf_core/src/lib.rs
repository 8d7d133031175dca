pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod store;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("STORE_UNAVAILABLE", "store failed").with_retryable(true);
        assert_eq!(err.code, "STORE_UNAVAILABLE");
        assert_eq!(err.message, "store failed");
        assert!(err.retryable);
        assert!(err.is("STORE_UNAVAILABLE"));
    }

    #[test]
    fn app_error_display_includes_details() {
        let err = AppError::new("AI_LLM_FAILED", "Generation failed").with_details("status=502");
        assert_eq!(err.to_string(), "[AI_LLM_FAILED] Generation failed (status=502)");
    }
}
