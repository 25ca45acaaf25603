use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use snapcode_engine::{ApiKey, GatewayConfig, VisionSettings};

#[derive(Debug, Parser)]
#[command(name = "snapcode_server")]
#[command(about = "Converts UI screenshots into utility-class markup", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, env = "SNAPCODE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Credential for the understanding service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "SNAPCODE_API_BASE", default_value = "https://api.openai.com")]
    pub api_base: String,

    #[arg(long, env = "SNAPCODE_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Deadline for one call to the understanding service.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Directory for spooled uploads. Defaults to the system temp dir.
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl ServerArgs {
    pub fn vision_settings(&self) -> VisionSettings {
        let mut settings = VisionSettings::new(ApiKey::new(self.api_key.clone()));
        settings.api_base = self.api_base.clone();
        settings.model = self.model.clone();
        settings
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig {
            deadline: Duration::from_secs(self.timeout_secs),
            ..GatewayConfig::default()
        };
        if let Some(dir) = &self.upload_dir {
            config.upload_dir = dir.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let args = ServerArgs::try_parse_from(["snapcode_server", "--api-key", "sk-test"]).unwrap();
        assert_eq!(args.bind, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        let vision = args.vision_settings();
        assert_eq!(vision.model, "gpt-4o");
        assert_eq!(vision.max_tokens, 3000);
        assert!(!format!("{vision:?}").contains("sk-test"));
        assert_eq!(args.gateway_config().deadline, Duration::from_secs(60));
    }

    #[test]
    fn overrides_apply() {
        let args = ServerArgs::try_parse_from([
            "snapcode_server",
            "--api-key",
            "k",
            "--timeout-secs",
            "5",
            "--upload-dir",
            "/var/spool/snapcode",
        ])
        .unwrap();
        let config = args.gateway_config();
        assert_eq!(config.deadline, Duration::from_secs(5));
        assert_eq!(config.upload_dir, PathBuf::from("/var/spool/snapcode"));
    }
}
