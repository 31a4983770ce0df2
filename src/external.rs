use serde::Serialize;

use crate::error::AppError;

/// Client settings for the hosted auth/database service, read from
/// `FIREBASE_*` variables. Nothing in the request path depends on it; it is
/// only checked at startup.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExternalAuthConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
}

impl ExternalAuthConfig {
    pub fn from_env() -> Self {
        // Read as raw strings; ids such as the sender id are all digits
        let var = |key: &str| {
            dotenvy::var(format!("FIREBASE_{}", key))
                .ok()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            api_key: var("API_KEY"),
            auth_domain: var("AUTH_DOMAIN"),
            database_url: var("DATABASE_URL"),
            project_id: var("PROJECT_ID"),
            storage_bucket: var("STORAGE_BUCKET"),
            messaging_sender_id: var("MESSAGING_SENDER_ID"),
            app_id: var("APP_ID"),
            measurement_id: var("MEASUREMENT_ID"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.missing_keys().is_empty()
    }

    pub fn missing_keys(&self) -> Vec<&'static str> {
        let required = [
            ("apiKey", &self.api_key),
            ("authDomain", &self.auth_domain),
            ("projectId", &self.project_id),
            ("appId", &self.app_id),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Missing external auth configuration keys: {:?}",
                missing
            )))
        }
    }
}
