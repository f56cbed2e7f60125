use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub media: MediaConfig,
}

/// Credentials for the remote media-hosting service.
#[derive(Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

// Manual Debug so the API secret never lands in startup logs.
impl fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Car listings API")]
pub struct Args {
    /// Host to bind to (overrides CAR_LISTINGS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CAR_LISTINGS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Document store connection string (overrides MONGODB_URI)
    #[arg(long)]
    pub mongodb_uri: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("CAR_LISTINGS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("CAR_LISTINGS_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing CAR_LISTINGS_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading CAR_LISTINGS_PORT"),
        };
        let env_mongodb = env::var("MONGODB_URI").ok();

        let media = MediaConfig {
            cloud_name: required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: required_env("CLOUDINARY_API_KEY")?,
            api_secret: required_env("CLOUDINARY_API_SECRET")?,
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            mongodb_uri: args
                .mongodb_uri
                .or(env_mongodb)
                .context("MONGODB_URI is not set and --mongodb-uri was not given")?,
            media,
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {}", name))
}
