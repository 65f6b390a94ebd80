use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinApiConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub coin_api: CoinApiConfig,
    pub upload: UploadConfig,
    pub admin_seed: Option<AdminSeedConfig>,
    pub frontend_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "coinwatch".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "coinwatch-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let coin_api = CoinApiConfig {
            base_url: std::env::var("COIN_API_BASE_URL")
                .unwrap_or_else(|_| "https://pro-api.coinmarketcap.com".into()),
            api_key: std::env::var("COIN_API_KEY")?,
        };
        let upload = UploadConfig {
            dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".into()),
            max_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(5 * 1024 * 1024),
            allowed_extensions: std::env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| "png,jpg,jpeg,gif,webp".into())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        };
        let admin_seed = match (
            std::env::var("ADMIN_NAME"),
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(name), Ok(email), Ok(password)) => Some(AdminSeedConfig {
                name,
                email,
                password,
            }),
            _ => None,
        };
        let frontend_origin = std::env::var("FRONTEND_ORIGIN").ok();
        Ok(Self {
            database_url,
            jwt,
            coin_api,
            upload,
            admin_seed,
            frontend_origin,
        })
    }
}
