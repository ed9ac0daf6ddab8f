//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints built
//! from the error's JSON context.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::ConfigMissingRequired => suggest_config_missing_required(context),
        ErrorCode::EmbeddingDimensionMismatch => suggest_dimension_mismatch(context),
        ErrorCode::StoreQueryFailed => suggest_store_query_failed(context),
        ErrorCode::SearchInvalidWeight => suggest_invalid_weight(context),
        _ => code.suggestion().to_string(),
    }
}

fn suggest_config_missing_required(context: Option<&Value>) -> String {
    let Some(key) = context
        .and_then(|c| c.get("config_key"))
        .and_then(Value::as_str)
    else {
        return ErrorCode::ConfigMissingRequired.suggestion().to_string();
    };
    let env_name = format!("VIBE_{}", key.replace('.', "_").to_uppercase());
    format!("Set `{key}` in config.toml, or export {env_name}")
}

fn suggest_dimension_mismatch(context: Option<&Value>) -> String {
    let expected = context.and_then(|c| c.get("expected")).and_then(Value::as_u64);
    let actual = context.and_then(|c| c.get("actual")).and_then(Value::as_u64);
    match (expected, actual) {
        (Some(expected), Some(actual)) => format!(
            "The embedding service returned {actual} dimensions but {expected} are configured. \
             Update embedding.text_dims / embedding.image_dims to match the deployed model"
        ),
        _ => ErrorCode::EmbeddingDimensionMismatch.suggestion().to_string(),
    }
}

fn suggest_store_query_failed(context: Option<&Value>) -> String {
    let predicate = context
        .and_then(|c| c.get("predicate"))
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty());
    match predicate {
        Some(predicate) => format!(
            "The candidate query failed with predicate:\n  {predicate}\nCheck the catalog schema with `vibe init`, \
             and that stored embeddings match the configured dimensions"
        ),
        None => ErrorCode::StoreQueryFailed.suggestion().to_string(),
    }
}

fn suggest_invalid_weight(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("image_weight")).and_then(Value::as_f64) {
        Some(weight) => format!(
            "image_weight {weight} is outside [0, 1]. Use 1.0 for image-only ranking, 0.0 for text-only"
        ),
        None => ErrorCode::SearchInvalidWeight.suggestion().to_string(),
    }
}
