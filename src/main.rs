//! Voicemint - AI Voice Dubbing for Videos
//!
//! This is the main entry point for the Voicemint command line tool, which
//! dubs videos with AI-generated, translated speech and plays the result in
//! sync with the muted video.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, error, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use voicemint::audio::{DecodedAudioBuffer, SyncPlayer, decode_wav};
use voicemint::cli::{Args, Commands};
use voicemint::config::Config;
use voicemint::error::VoicemintError;
use voicemint::media::{FfplayAudioOutput, FfplayVideo, MediaCommandBuilder, MediaProcessorFactory, MediaProcessorTrait};
use voicemint::services::{LANGUAGES, ServiceFactory, SynthVoice};
use voicemint::session::{SessionContext, SessionStore};
use voicemint::workflow::{DubRequest, Workflow};

// Single-threaded: every operation runs on one event loop
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Voicemint - AI Voice Dubbing");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let mut session = SessionContext::init(SessionStore::from_config(&config.session)).await?;

    if let Err(e) = run(args.command, config, &mut session).await {
        error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, config: Config, session: &mut SessionContext) -> voicemint::error::Result<()> {
    match command {
        Commands::Signup { email, password } => {
            let user = session.sign_up(&email, &password).await?;
            println!("Account created. Signed in as {}", user.email);
        }
        Commands::Login { email, password } => {
            let user = session.sign_in(&email, &password).await?;
            println!("Signed in as {}", user.email);
        }
        Commands::Logout => {
            session.sign_out().await?;
            println!("Signed out");
        }
        Commands::Whoami => match session.current_user() {
            Some(user) => println!("{}", user.email),
            None => println!("Not signed in"),
        },
        Commands::Voices => {
            println!("\nAvailable Voices:");
            println!("{:<10} {:<25}", "Name", "Description");
            println!("{}", "-".repeat(35));
            for voice in SynthVoice::ALL {
                println!("{:<10} {:<25}", voice.name(), voice.label());
            }
            println!("{:<10} {:<25}", "custom", "Upload Custom Voice (--custom-audio)");
        }
        Commands::Languages => {
            println!("\nTarget Languages:");
            println!("{:<6} {:<25}", "Code", "Language");
            println!("{}", "-".repeat(31));
            for (code, name) in LANGUAGES {
                println!("{:<6} {:<25}", code, name);
            }
        }
        Commands::Play { video, audio } => {
            session.require_user()?;

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.check_availability().await?;

            let bytes = tokio::fs::read(&audio).await?;
            let buffer = Arc::new(decode_wav(&bytes)?);
            play_synchronized(&config, media.as_ref(), &video, buffer).await?;
        }
        command => {
            let user = session.require_user()?;
            info!("Signed in as {}", user.email);

            let service = ServiceFactory::create_service(config.service.clone(), config.api_key()?)?;
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            let mut workflow = Workflow::new(config.clone(), service, media);

            run_feature(command, &config, &mut workflow).await?;
        }
    }

    Ok(())
}

async fn run_feature(command: Commands, config: &Config, workflow: &mut Workflow) -> voicemint::error::Result<()> {
    match command {
        Commands::Script { input } => {
            workflow.media().check_availability().await?;
            let script = workflow.generate_script(&input).await?;
            println!("{}", script);
        }
        Commands::Dub { input, language, voice, emotion, speed, script, custom_audio, output, play } => {
            workflow.media().check_availability().await?;
            if !input.exists() {
                return Err(VoicemintError::FileNotFound(input.display().to_string()));
            }

            let (dubbed, suffix) = match custom_audio {
                Some(custom_audio) => (workflow.load_custom_audio(&custom_audio).await?, "custom".to_string()),
                None => {
                    workflow.check_dub_voice(&voice)?;
                    let script = match script {
                        Some(script) => script,
                        None => {
                            let script = workflow.generate_script(&input).await?;
                            println!("Script:\n{}\n", script);
                            script
                        }
                    };

                    let request = DubRequest { script, language: language.clone(), voice, emotion, speed };
                    (workflow.dub(&request).await?, language)
                }
            };

            if let Some(translated) = &dubbed.translated_script {
                println!("Translated script:\n{}\n", translated);
            }

            let output = output.unwrap_or_else(|| default_dub_path(&input, &suffix));
            workflow.export_wav(&dubbed, &output).await?;
            println!("Dubbed audio saved to {}", output.display());

            if play {
                play_synchronized(config, workflow.media(), &input, Arc::clone(&dubbed.audio)).await?;
            }
        }
        Commands::Tts { text, output, voice, emotion, speed } => {
            let path = workflow.text_to_speech(&text, voice, emotion, speed, &output).await?;
            println!("Speech saved to {}", path.display());
        }
        Commands::Stt { input } => {
            let transcript = workflow.transcribe(Some(&input)).await?;
            println!("{}", transcript);
        }
        // Account and playback commands never reach the workflow
        _ => {}
    }

    Ok(())
}

/// <video stem>_<suffix>.wav next to the video
fn default_dub_path(video: &Path, suffix: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dub".to_string());
    video.with_file_name(format!("{}_{}.wav", stem, suffix))
}

/// Play the audio against the muted video until either ends or Ctrl-C
async fn play_synchronized(
    config: &Config,
    media: &dyn MediaProcessorTrait,
    video: &Path,
    buffer: Arc<DecodedAudioBuffer>,
) -> voicemint::error::Result<()> {
    let duration = media.probe_duration(video).await?;
    let builder = MediaCommandBuilder::new(
        &config.media.ffmpeg_path,
        &config.media.ffprobe_path,
        &config.media.ffplay_path,
    );

    let mut player = SyncPlayer::new(
        FfplayVideo::new(builder.clone(), video, duration),
        FfplayAudioOutput::new(builder),
        buffer,
    );

    let bar = ProgressBar::new(1000);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.magenta/white}] {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_message(format!("{}", player.video().path().display()));

    player.play()?;
    let mut ticker = tokio::time::interval(Duration::from_millis(config.audio.tick_millis));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                player.on_time_update();
                bar.set_position((player.progress() * 1000.0) as u64);
                player.poll();
                if !player.is_playing() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Playback interrupted");
                player.stop();
                break;
            }
        }
    }

    bar.finish_and_clear();
    info!("Playback finished");
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".voicemint").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "voicemint.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so command output stays clean on stdout
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("voicemint.log").display());

    Ok(())
}
