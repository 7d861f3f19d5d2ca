pub mod decode;
pub mod encode;
pub mod inspect;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotconf::{CodecRegistry, KeyRing, Settings, load_settings};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "hotconf",
    author,
    version,
    about = "hotconf - typed configuration values on the command line",
    long_about = "Encode and decode tagged configuration values and inspect property files.\n\nAES \
                  keys come from --settings or the HOTCONF_ENCRYPT_KEY / HOTCONF_DECRYPT_KEY \
                  environment variables."
)]
pub struct Cli {
    /// Settings file (.toml, .yaml or .yml)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// AES key for encoding, 32 hex characters
    #[arg(long, global = true, env = "HOTCONF_ENCRYPT_KEY", hide_env_values = true)]
    pub encrypt_key: Option<String>,

    /// AES key for decoding, 32 hex characters (defaults to the encrypt key)
    #[arg(long, global = true, env = "HOTCONF_DECRYPT_KEY", hide_env_values = true)]
    pub decrypt_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Encode a value as [codec:payload]")]
    Encode(encode::EncodeArgs),

    #[command(about = "Decode a [codec:payload] value")]
    Decode(decode::DecodeArgs),

    #[command(about = "List the keys of a property file and their tags")]
    Inspect(inspect::InspectArgs)
}

/// Settings and codecs shared by the codec commands.
pub struct CodecContext {
    pub settings: Settings,
    pub codecs: CodecRegistry
}

impl Cli {
    pub fn context(&self) -> Result<CodecContext> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => Settings::default()
        };
        if let Some(key) = &self.encrypt_key {
            settings.keys.encrypt_key = Some(key.clone());
        }
        if let Some(key) = &self.decrypt_key {
            settings.keys.decrypt_key = Some(key.clone());
        }

        let keys = KeyRing::new();
        settings
            .keys
            .apply(&keys)
            .context("Invalid AES key configuration")?;
        tracing::debug!("Key ring configured: {}", keys.is_configured());

        Ok(CodecContext {
            settings,
            codecs: CodecRegistry::with_defaults(Arc::new(keys))
        })
    }
}
