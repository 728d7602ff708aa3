// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `beacon serve` and `beacon devices`: wiring of the long-running process.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use beacon_cast::{CachedDirectory, CommandTransport, SessionManager, discovery_sources};
use beacon_config::BeaconConfig;
use beacon_core::{BeaconError, Clock, DeviceDirectory, NotificationStore, SystemClock};
use beacon_media::{
    ArtifactStore, ContentPipeline, FfmpegEncoder, FontCardRenderer, GenerationDeduplicator,
    HttpNarrationSynthesizer, PipelineSettings,
};
use beacon_scheduler::{Scheduler, SchedulerSettings};
use beacon_storage::SqliteNotificationStore;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the scheduler loop and, when enabled, the HTTP gateway until a
/// shutdown signal arrives. Live sessions are stopped before returning.
pub async fn run_serve(config: BeaconConfig) -> Result<(), BeaconError> {
    init_tracing(&config.logging.level);

    info!("starting beacon serve");

    let store = {
        let store = SqliteNotificationStore::new(config.storage.clone());
        store.initialize().await?;
        Arc::new(store) as Arc<dyn NotificationStore>
    };

    let cancel = shutdown::install_signal_handler();

    let directory = build_directory(&config)?;
    let refresh = directory.spawn_refresh(
        Duration::from_secs(config.cast.discovery_refresh_secs),
        cancel.clone(),
    );
    let transport = Arc::new(CommandTransport::from_config(&config.cast)?);
    let pipeline = Arc::new(build_pipeline(&config)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let media_base_url = config.media_base_url();
    info!(media_base_url = %media_base_url, "devices will fetch media from this base");
    let sessions = Arc::new(SessionManager::new(
        directory.clone(),
        transport,
        store.clone(),
        media_base_url,
        Duration::from_millis(config.cast.settle_delay_ms),
    ));

    #[cfg(feature = "gateway")]
    let gateway = if config.gateway.enabled {
        let server_config = beacon_gateway::ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        let state = beacon_gateway::GatewayState {
            store: store.clone(),
            directory: directory.clone(),
            sessions: sessions.clone(),
            pipeline: pipeline.clone(),
            clock: clock.clone(),
            start_time: std::time::Instant::now(),
        };
        let gateway_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            if let Err(e) =
                beacon_gateway::start_server(&server_config, state, gateway_cancel.clone()).await
            {
                error!(error = %e, "gateway stopped, shutting down");
                gateway_cancel.cancel();
            }
        }))
    } else {
        info!("gateway disabled");
        None
    };

    let scheduler = Scheduler::new(
        store,
        pipeline,
        sessions,
        clock,
        SchedulerSettings::from_config(&config.scheduler, &config.cast),
    );
    scheduler.run(cancel.clone()).await;

    #[cfg(feature = "gateway")]
    if let Some(handle) = gateway
        && let Err(e) = handle.await
    {
        warn!(error = %e, "gateway task ended abnormally");
    }
    if let Err(e) = refresh.await {
        warn!(error = %e, "discovery refresh task ended abnormally");
    }

    info!("beacon serve shutdown complete");
    Ok(())
}

/// Runs one discovery pass over every configured source and prints the result.
pub async fn run_devices(config: BeaconConfig) -> Result<(), BeaconError> {
    init_tracing(&config.logging.level);

    let directory = build_directory(&config)?;
    let devices = directory.discover().await?;
    if devices.is_empty() {
        println!("no devices found");
        return Ok(());
    }
    for device in devices {
        println!("{}\t{}", device.name, device.address);
    }
    Ok(())
}

fn build_directory(config: &BeaconConfig) -> Result<Arc<CachedDirectory>, BeaconError> {
    let sources = discovery_sources(&config.cast)?;
    if sources.is_empty() {
        warn!("no static devices and no discovery command configured");
    }
    Ok(Arc::new(CachedDirectory::new(
        sources,
        Duration::from_secs(config.cast.discovery_timeout_secs),
    )))
}

fn build_pipeline(config: &BeaconConfig) -> Result<ContentPipeline, BeaconError> {
    let media = &config.media;
    let renderer = FontCardRenderer::with_font_paths(
        media.width,
        media.height,
        media.title_font_path.as_deref().map(Path::new),
        media.body_font_path.as_deref().map(Path::new),
        media.footer_font_path.as_deref().map(Path::new),
    );
    if !renderer.has_text() {
        warn!("no usable fonts configured, cards will be rendered without text");
    }

    let narrator = HttpNarrationSynthesizer::new(&config.narration)?;
    if !narrator.is_enabled() {
        info!("narration disabled, streams will be silent");
    }

    Ok(ContentPipeline::new(
        ArtifactStore::new(&media.data_dir),
        Arc::new(GenerationDeduplicator::new()),
        Arc::new(renderer),
        Arc::new(narrator),
        Arc::new(FfmpegEncoder::new(
            &media.ffmpeg_path,
            config.narration.sample_rate_hz,
        )),
        PipelineSettings::from_config(media, &config.narration)?,
    ))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("beacon={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
