use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use snapcode_core::{ImageFile, PreviewSettings};
use snapcode_engine::{export_standalone, render_host_page, write_atomically, EngineConfig};
use snapcode_logging::{snap_info, LogDestination};

use snapcode_app::{media_type_for, AppArgs, Driver, EffectRunner};

fn main() -> Result<()> {
    let args = AppArgs::parse();
    snapcode_logging::initialize(
        LogDestination::from_optional_file(args.log_file.clone()),
        snapcode_logging::parse_level(&args.log_level),
    );

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file = ImageFile::new(name, media_type_for(&args.image), bytes);

    let config = EngineConfig {
        client: args.client_settings(),
        ..EngineConfig::default()
    };
    let runner = EffectRunner::new(config)?;
    let idle_timeout = Duration::from_secs(args.timeout_secs) + Duration::from_secs(5);
    let mut driver = Driver::new(runner, idle_timeout);

    let result = driver.convert(file);
    driver.remove();
    let artifact = result.map_err(|err| anyhow!("{}", err.message))?;

    let out = export_standalone(&args.out_path(), &artifact.markup)?;
    println!("{}", out.display());

    if let Some(path) = &args.preview {
        let page = render_host_page(&artifact.markup, PreviewSettings::default())
            .context("generated markup is empty")?;
        write_atomically(path, &page)?;
        snap_info!("Preview page written to {:?}", path);
        println!("{}", path.display());
    }
    Ok(())
}
