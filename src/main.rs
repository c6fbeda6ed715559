//! focus-coach: watches the active window and talks back through a TTS voice.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use focus_coach::coach::OpenAiGenerator;
use focus_coach::config::{Config, Secrets};
use focus_coach::pipeline::NotificationPipeline;
use focus_coach::platform::NativeObserver;
use focus_coach::playback::RodioOutput;
use focus_coach::service::CoachService;
use focus_coach::tts::PlayHtSynthesizer;

#[derive(Parser, Debug)]
#[command(name = "focus-coach", about = "Desktop focus coach with a drill-sergeant voice")]
struct Args {
    /// Path to focus-coach.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (suppress noisy HTTP internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("focus-coach starting");

    let config = Config::load(args.config.as_deref());
    info!("Config loaded: {:?}", config.coach);

    // Missing secrets are the one fatal startup error.
    let secrets = Secrets::from_env()?;

    let observer = NativeObserver::new()?;
    let output = RodioOutput::new()?;

    let generator = Arc::new(OpenAiGenerator::new(
        config.coach.clone(),
        &secrets.openai_api_key,
    ));
    let synthesizer = Arc::new(PlayHtSynthesizer::new(
        config.speech.clone(),
        &secrets.playht_api_key,
        &secrets.playht_user_id,
    ));

    let pipeline = NotificationPipeline::new(
        generator,
        synthesizer,
        Box::new(output),
        config.speech.sample_rate,
    );

    let mut service = CoachService::new(
        config.watcher.clone(),
        config.coach.history_size,
        Box::new(observer),
        pipeline,
    );

    info!(
        "Coach ready (model: {}, voice rate: {} Hz)",
        config.coach.model, config.speech.sample_rate
    );

    service.run().await;

    Ok(())
}
