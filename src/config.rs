use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Linear fare: `base + per_km * distance`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FareConfig {
    pub base: f64,
    pub per_km: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base: 15.0,
            per_km: 8.0,
        }
    }
}

/// Admin account ensured at startup when both email and password are set.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub fare: FareConfig,
    pub events_buffer: usize,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "yango".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "yango-clients".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 7),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 30),
        };
        let defaults = FareConfig::default();
        let fare = FareConfig {
            base: env_parse("FARE_BASE").unwrap_or(defaults.base),
            per_km: env_parse("FARE_PER_KM").unwrap_or(defaults.per_km),
        };
        let events_buffer = env_parse("EVENTS_BUFFER").unwrap_or(1024);

        let bootstrap_admin = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            max_connections,
            jwt,
            fare,
            events_buffer,
            bootstrap_admin,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
