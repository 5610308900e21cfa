use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Outgoing mail. Without an API key codes are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub verify_code_ttl_minutes: i64,
    pub public_base_url: String,
}

fn minutes(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "truefeedback".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "truefeedback-users".into()),
            ttl_minutes: minutes("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: minutes("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            api_key: std::env::var("MAIL_API_KEY").ok().filter(|k| !k.is_empty()),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "onboarding@resend.dev".into()),
        };
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            database_url,
            jwt,
            mail,
            verify_code_ttl_minutes: minutes("VERIFY_CODE_TTL_MINUTES", 60),
            public_base_url,
        })
    }

    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/u/{}", self.public_base_url, username)
    }
}
