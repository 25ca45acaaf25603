use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use snapcode_core::MediaType;
use snapcode_engine::{ClientSettings, EXPORT_FILE_NAME};

#[derive(Debug, Parser)]
#[command(name = "snapcode_app")]
#[command(about = "Turns a UI screenshot into a standalone HTML component", long_about = None)]
pub struct AppArgs {
    /// PNG, JPG or WebP screenshot to convert.
    pub image: PathBuf,

    /// Process-image endpoint of a running snapcode_server.
    #[arg(
        long,
        env = "SNAPCODE_SERVER",
        default_value = "http://127.0.0.1:3000/api/process-image"
    )]
    pub server: String,

    /// Where to write the standalone component page.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Also write a sandboxed live-preview page here.
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Give up on the server after this many seconds.
    #[arg(long, default_value_t = 90)]
    pub timeout_secs: u64,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl AppArgs {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.server.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..ClientSettings::default()
        }
    }

    pub fn out_path(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| PathBuf::from(EXPORT_FILE_NAME))
    }
}

/// Declared media type for a local file, from its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => MediaType::Png.mime(),
        Some("jpg") | Some("jpeg") => MediaType::Jpeg.mime(),
        Some("webp") => MediaType::Webp.mime(),
        _ => "application/octet-stream",
    }
}
