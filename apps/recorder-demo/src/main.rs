//! Screen Recorder demo
//!
//! Records the synthetic test pattern through the OpenH264 backend, with a
//! stand-in permission UI that grants every prompt.
//!
//! Usage: `recorder-demo [config.json] [seconds]`

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use capture::{
    ChannelBroker, GrantToken, PermissionOutcome, PermissionRequest, RESULT_OK, SyntheticProvider,
};
use encoder::{Container, OpenH264Backend};
use recording_protocol::MODULE_NAME;
use recording_session::{RecorderConfig, RecorderPlatform, RecordingSession, StaticHost};

const DEFAULT_SECONDS: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recorder_demo=debug".parse()?)
                .add_directive("recording_session=debug".parse()?)
                .add_directive("encoder=info".parse()?)
                .add_directive("capture=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = match args.get(1) {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path))?;
            RecorderConfig::from_json(&json).with_context(|| format!("parsing config {}", path))?
        }
        None => RecorderConfig::default(),
    };
    let seconds = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("invalid duration '{}'", s))?,
        None => DEFAULT_SECONDS,
    };

    // The software backend writes raw H.264 only
    if config.container != Container::AnnexB {
        warn!(
            "Container {:?} not supported by the OpenH264 backend, writing Annex-B",
            config.container
        );
        config.container = Container::AnnexB;
    }

    info!("Starting {} demo ({}s)", MODULE_NAME, seconds);

    let (broker, requests) = ChannelBroker::new();
    let platform = RecorderPlatform {
        host: Arc::new(StaticHost::new(std::env::temp_dir())),
        broker: Arc::new(broker),
        projections: Arc::new(SyntheticProvider::new()),
        encoders: Arc::new(OpenH264Backend::boxed),
    };
    let session = Arc::new(RecordingSession::new(config, platform));

    spawn_permission_ui(requests, Arc::downgrade(&session))?;

    if !session.is_available() {
        anyhow::bail!("screen capture is not available");
    }
    session
        .check_encoder()
        .context("encoder cannot record with this configuration")?;

    if let Err(e) = session.start_recording().await {
        error!("Start failed: {}", e);
        println!("{}", serde_json::to_string(&e.to_bridge_error())?);
        return Ok(());
    }
    info!("Recording for {}s", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;

    match session.stop_recording().await {
        Ok(message) => info!("{}", message),
        Err(e) => {
            error!("Stop failed: {}", e);
            println!("{}", serde_json::to_string(&e.to_bridge_error())?);
        }
    }

    println!("{}", serde_json::to_string(&session.recording_status())?);
    Ok(())
}

/// Grant every capture prompt, the way a user tapping "Start now" would
fn spawn_permission_ui(
    requests: crossbeam_channel::Receiver<PermissionRequest>,
    session: Weak<RecordingSession>,
) -> anyhow::Result<()> {
    std::thread::Builder::new()
        .name("permission-ui".to_string())
        .spawn(move || {
            while let Ok(request) = requests.recv() {
                let Some(session) = session.upgrade() else {
                    break;
                };
                info!("Capture prompt shown (request code {})", request.request_code);
                let token = GrantToken::new(RESULT_OK, b"demo-grant".to_vec());
                session.on_permission_result(
                    request.request_code,
                    PermissionOutcome::from_result(true, Some(token)),
                );
            }
        })
        .context("spawning permission UI thread")?;
    Ok(())
}
