use anyhow::{bail, Context, Result};
use media_blob::{MediaConfig, S3Config};

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: S3Config,
    pub download_chunk_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; unset and empty values count as absent
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| var(key).with_context(|| format!("{key} environment variable required"));
        // GRPC_* names are still honoured for existing deployments
        let listen_var = |key: &str, legacy: &str, default: &str| {
            var(key)
                .or_else(|| var(legacy))
                .unwrap_or_else(|| default.to_string())
        };

        let port = listen_var("RPC_PORT", "GRPC_PORT", "5051")
            .parse::<u16>()
            .context("RPC_PORT must be a port number")?;
        let use_ssl = parse_bool(&var_or("MINIO_USE_SSL", "true"))
            .context("MINIO_USE_SSL must be true or false")?;
        let download_chunk_bytes = var_or("MEDIA_DOWNLOAD_CHUNK_BYTES", "32768")
            .parse::<usize>()
            .context("MEDIA_DOWNLOAD_CHUNK_BYTES must be a byte count")?;
        if download_chunk_bytes == 0 {
            bail!("MEDIA_DOWNLOAD_CHUNK_BYTES must be greater than zero");
        }

        let storage = S3Config::new(required("MINIO_ENDPOINT")?, required("MINIO_BUCKET_NAME")?)
            .with_credentials(var_or("MINIO_ACCESS_KEY", ""), var_or("MINIO_SECRET_KEY", ""))
            .with_ssl(use_ssl)
            .with_public_url(var_or("MINIO_FILE_URL", ""))
            .with_region(var_or("MINIO_REGION", "us-east-1"));

        Ok(Self {
            host: listen_var("RPC_HOST", "GRPC_HOST", "localhost"),
            port,
            storage,
            download_chunk_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn media(&self) -> MediaConfig {
        MediaConfig::default().with_download_chunk_bytes(self.download_chunk_bytes)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
