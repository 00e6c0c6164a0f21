use serde::{Deserialize, Serialize};

/// Aggregate download and rating metrics for a package.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PackageMetricsResponse {
    #[schema(example = "AliceMods")]
    pub namespace: String,
    #[schema(example = "RocketLauncher")]
    pub name: String,
    /// Counted downloads summed over all versions.
    pub downloads: i64,
    pub rating_score: u64,
}

/// Download metrics for a single version.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VersionMetricsResponse {
    pub namespace: String,
    pub name: String,
    #[schema(example = "1.0.0")]
    pub version_number: String,
    pub downloads: i64,
}

/// Request body for rating a package.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RateRequest {
    /// Either `rated` or `unrated`.
    #[schema(example = "rated")]
    pub target_state: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RateResponse {
    /// The state that was applied.
    pub state: String,
    /// The package's resulting score.
    pub score: u64,
}

/// Request body for changing a package's deprecation flag.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeprecateRequest {
    pub deprecate: bool,
}

/// Plain acknowledgement body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Success")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deprecate_request_uses_the_deprecate_field() {
        let parsed: DeprecateRequest = serde_json::from_str(r#"{"deprecate": true}"#).unwrap();
        assert!(parsed.deprecate);
        assert!(serde_json::from_str::<DeprecateRequest>(r#"{"is_deprecated": true}"#).is_err());
    }

    #[test]
    fn acknowledgement_body_shape() {
        let body = serde_json::to_value(MessageResponse {
            message: "Success".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"message": "Success"}));
    }
}
