use super::error::{PostgrestDaoError, PostgrestResult};

/// Runtime configuration describing how to reach the PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Root URL of the PostgREST API.
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token.
    pub api_key: String,
    /// Non-default schema, sent as a profile header.
    pub schema: Option<String>,
}

impl PostgrestConfig {
    /// Config for the default schema.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            schema: None,
        }
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> PostgrestResult<Self> {
        let base_url = std::env::var("POSTGREST_URL").map_err(|_| {
            PostgrestDaoError::MissingEnvVar {
                var: "POSTGREST_URL",
            }
        })?;
        let api_key = std::env::var("POSTGREST_KEY").map_err(|_| {
            PostgrestDaoError::MissingEnvVar {
                var: "POSTGREST_KEY",
            }
        })?;

        let mut config = Self::new(base_url, api_key);
        config.schema = std::env::var("POSTGREST_SCHEMA").ok();
        Ok(config)
    }
}
