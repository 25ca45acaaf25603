use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use snapcode_engine::{ArtifactGateway, OpenAiVisionClient};
use snapcode_logging::{snap_info, LogDestination};
use snapcode_server::{routes, ServerArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    snapcode_logging::initialize(
        LogDestination::from_optional_file(args.log_file.clone()),
        snapcode_logging::parse_level(&args.log_level),
    );

    let vision = args.vision_settings();
    if vision.api_key.is_empty() {
        bail!("the understanding-service API key is empty");
    }
    let service = OpenAiVisionClient::new(vision).context("building the understanding-service client")?;
    let gateway = Arc::new(ArtifactGateway::new(args.gateway_config(), Arc::new(service)));

    let (addr, server) = warp::serve(routes(gateway))
        .try_bind_with_graceful_shutdown(args.bind, async {
            let _ = tokio::signal::ctrl_c().await;
            snap_info!("Shutting down");
        })
        .with_context(|| format!("binding {}", args.bind))?;
    snap_info!("Listening on http://{}/api/process-image", addr);
    server.await;
    Ok(())
}
