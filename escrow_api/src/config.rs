use log::*;
use epg_common::Secret;

/// The remote environment the client talks to. Sandbox transactions never move real money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PROD" | "PRODUCTION" | "LIVE" => Self::Production,
            "SIT" | "SANDBOX" | "TEST" => Self::Sandbox,
            other => {
                warn!("Unknown escrow environment '{other}'. Falling back to the sandbox.");
                Self::Sandbox
            },
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EscrowApiConfig {
    /// Domain of the live API, e.g. "api.escrow.example"
    pub api_domain: String,
    /// Domain of the sandbox API, e.g. "sandbox.escrow.example"
    pub sandbox_domain: String,
    /// Domain of the authentication service, reported by `ping`.
    pub auth_domain: String,
    pub environment: Environment,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Bearer credential attached to every request.
    pub access_token: Secret<String>,
}

impl EscrowApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_domain = std::env::var("EPG_ESCROW_API_DOMAIN").unwrap_or_else(|_| {
            warn!("EPG_ESCROW_API_DOMAIN not set, using api.escrow.example as default");
            "api.escrow.example".to_string()
        });
        let sandbox_domain = std::env::var("EPG_ESCROW_SANDBOX_DOMAIN").unwrap_or_else(|_| {
            warn!("EPG_ESCROW_SANDBOX_DOMAIN not set, using sandbox.escrow.example as default");
            "sandbox.escrow.example".to_string()
        });
        let auth_domain = std::env::var("EPG_ESCROW_AUTH_DOMAIN").unwrap_or_else(|_| {
            warn!("EPG_ESCROW_AUTH_DOMAIN not set, using auth.escrow.example as default");
            "auth.escrow.example".to_string()
        });
        let environment = std::env::var("EPG_ESCROW_ENVIRONMENT")
            .map(|s| Environment::from_str_or_default(&s))
            .unwrap_or_default();
        let client_id = std::env::var("EPG_ESCROW_CLIENT_ID").unwrap_or_else(|_| {
            error!("EPG_ESCROW_CLIENT_ID is not set. Please set it to the client id of your registered application.");
            String::default()
        });
        let client_secret = Secret::new(std::env::var("EPG_ESCROW_CLIENT_SECRET").unwrap_or_else(|_| {
            error!("EPG_ESCROW_CLIENT_SECRET is not set. Callback signatures cannot be verified without it.");
            String::default()
        }));
        let access_token = Secret::new(std::env::var("EPG_ESCROW_ACCESS_TOKEN").unwrap_or_else(|_| {
            error!("EPG_ESCROW_ACCESS_TOKEN is not set. API calls will be rejected by the remote service.");
            String::default()
        }));
        Self { api_domain, sandbox_domain, auth_domain, environment, client_id, client_secret, access_token }
    }

    /// The domain in effect for the configured environment.
    pub fn domain(&self) -> &str {
        match self.environment {
            Environment::Production => &self.api_domain,
            Environment::Sandbox => &self.sandbox_domain,
        }
    }
}
