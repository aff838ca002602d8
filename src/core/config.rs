use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means no durable backend is configured and the server
    /// falls back to the in-memory store (development only).
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub widget_api_key: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
}

const DEFAULT_JWT_SECRET: &str = "dev-only-session-secret";
const DEFAULT_WIDGET_KEY: &str = "dev-only-widget-key";

impl Config {
    /// Loads the configuration from environment variables, reading a
    /// `.env` file first if one exists.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            eprintln!("WARNING: JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let widget_api_key = env::var("WIDGET_API_KEY").unwrap_or_else(|_| {
            eprintln!(
                "WARNING: WIDGET_API_KEY not set, using default (not secure for production!)"
            );
            DEFAULT_WIDGET_KEY.to_string()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "50".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            database_url,
            jwt_secret,
            widget_api_key,
            server_host,
            server_port,
            max_connections,
            app_env,
        })
    }

    /// Prints the configuration, hiding secrets.
    pub fn print_info(&self) {
        println!("   Server Configuration:");
        println!("   Environment: {}", self.app_env);
        println!("   Server Address: {}:{}", self.server_host, self.server_port);
        match &self.database_url {
            Some(url) => println!("   Database: {}", Self::mask_url(url)),
            None => println!("   Database: (none, in-memory store)"),
        }
        println!("   Max DB Connections: {}", self.max_connections);
        println!(
            "   JWT Secret: {}",
            if self.jwt_secret == DEFAULT_JWT_SECRET {
                "USING DEFAULT (INSECURE!)"
            } else {
                "custom secret configured"
            }
        );
        println!(
            "   Widget API Key: {}",
            if self.widget_api_key == DEFAULT_WIDGET_KEY {
                "USING DEFAULT (INSECURE!)"
            } else {
                "custom key configured"
            }
        );
    }

    /// Masks credentials in the database URL for logging.
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}
