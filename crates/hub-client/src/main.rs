use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hub_client::event::{self, ClientEvent};
use hub_client::interaction::ToggleOutcome;
use hub_client::stats::render_footer;
use hub_client::upload::UploadOutcome;
use hub_client::{ClientSession, HubApi};
use hub_proto::config::Config;
use hub_proto::protocol::ResourceId;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hubctl", version, about = "Command-line client for a video hub")]
struct Cli {
    /// Hub base URL; overrides the config file.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the live channel and stats until interrupted.
    Watch,
    /// Fetch the stats counters once.
    Stats,
    /// Toggle the like on a video.
    Like { video_id: String },
    /// Toggle a stream in your favorites.
    Favorite { stream_id: String },
    /// Post a comment on a stream.
    Comment { stream_id: String, text: String },
    /// Upload a video file.
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        tags: String,
        /// Media type to declare instead of guessing from the extension.
        #[arg(long = "type")]
        media_type: Option<String>,
    },
    /// Check that the hub is up.
    Health,
    /// Print the config path and the effective config.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hub_client=debug")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if let Some(base_url) = cli.base_url {
        config.hub.base_url = base_url;
    }

    match cli.command {
        Command::Config => {
            println!("# {}", config_path.display());
            print!("{}", toml_string(&config)?);
            Ok(())
        }
        Command::Health => {
            let api = HubApi::new(&config)?;
            let health = api.health().await?;
            match health.version {
                Some(v) => println!("{} ({})", health.status, v),
                None => println!("{}", health.status),
            }
            Ok(())
        }
        Command::Stats => {
            let api = HubApi::new(&config)?;
            let snapshot = api.stats().await?;
            println!("{}", render_footer(config.hub.profile, &snapshot));
            Ok(())
        }
        Command::Watch => watch(config).await,
        Command::Like { video_id } => like(config, video_id.into()).await,
        Command::Favorite { stream_id } => favorite(config, stream_id.into()).await,
        Command::Comment { stream_id, text } => comment(config, stream_id.into(), &text).await,
        Command::Upload {
            file,
            title,
            description,
            tags,
            media_type,
        } => upload(config, file, title, description, tags, media_type).await,
    }
}

fn toml_string(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let profile = config.hub.profile;
    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(config, tx)?;
    session.start()?;
    info!("watching {} (ctrl-c to stop)", session.api().base_url());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(ev) = rx.recv() => {
                session.apply_event(&ev);
                let line = match &ev {
                    ClientEvent::Connection(state) => Some(format!("[{}]", state.label())),
                    ClientEvent::Live(msg) => Some(msg.summary()),
                    ClientEvent::Notice(text) => Some(format!("notice: {}", text)),
                    ClientEvent::Reload => Some("reload".to_string()),
                    ClientEvent::Stats(snapshot) => Some(render_footer(profile, snapshot)),
                    ClientEvent::Alert(text) => Some(format!("alert: {}", text)),
                    _ => None,
                };
                if let Some(line) = line {
                    println!("{} {}", chrono::Local::now().format("%H:%M:%S"), line);
                }
            }
        }
    }

    session.shutdown();
    info!("stopped");
    Ok(())
}

async fn like(config: Config, video_id: ResourceId) -> anyhow::Result<()> {
    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(config, tx)?;
    match session.toggle_like(video_id.clone()).await {
        ToggleOutcome::Applied(state) => {
            let verb = if state.liked { "liked" } else { "unliked" };
            println!("{} #{} ({} likes)", verb, video_id, state.likes);
            Ok(())
        }
        ToggleOutcome::LoginRequired => {
            print_redirects(&mut rx);
            anyhow::bail!("login required")
        }
        ToggleOutcome::Failed(reason) => anyhow::bail!("like failed: {}", reason),
    }
}

async fn favorite(config: Config, stream_id: ResourceId) -> anyhow::Result<()> {
    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(config, tx)?;
    match session.toggle_favorite(stream_id.clone()).await {
        ToggleOutcome::Applied(action) => {
            match action {
                Some(a) => println!("#{}: {:?}", stream_id, a),
                None => println!("#{}: updated", stream_id),
            }
            Ok(())
        }
        ToggleOutcome::LoginRequired => {
            print_redirects(&mut rx);
            anyhow::bail!("login required")
        }
        ToggleOutcome::Failed(reason) => anyhow::bail!("favorite failed: {}", reason),
    }
}

async fn comment(config: Config, stream_id: ResourceId, text: &str) -> anyhow::Result<()> {
    let (tx, mut rx) = event::channel();
    let session = ClientSession::new(config, tx)?;
    match session.post_comment(stream_id.clone(), text).await {
        ToggleOutcome::Applied(()) => {
            println!("commented on #{}", stream_id);
            Ok(())
        }
        ToggleOutcome::LoginRequired => {
            print_redirects(&mut rx);
            anyhow::bail!("login required")
        }
        ToggleOutcome::Failed(reason) => anyhow::bail!("comment failed: {}", reason),
    }
}

fn print_redirects(rx: &mut event::EventReceiver) {
    while let Ok(ev) = rx.try_recv() {
        if let ClientEvent::Redirect(url) = ev {
            eprintln!("log in at {}", url);
        }
    }
}

async fn upload(
    config: Config,
    file: PathBuf,
    title: Option<String>,
    description: String,
    tags: String,
    media_type: Option<String>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = event::channel();
    let mut session = ClientSession::new(config, tx)?;

    if let Some(title) = title {
        session.set_title(title);
    }
    session.set_description(description);
    session.set_tags(tags);
    session.select_file(&file, media_type).await?;

    let printer = tokio::spawn(async move {
        let mut last = None;
        while let Some(ev) = rx.recv().await {
            match ev {
                ClientEvent::UploadProgress(p) => {
                    let pct = p.percent();
                    if pct.is_some() && pct != last {
                        eprint!("\r{:>3}%", pct.unwrap_or(0));
                        last = pct;
                    }
                }
                ClientEvent::Alert(text) => eprintln!("\n{}", text),
                _ => {}
            }
        }
        eprintln!();
    });

    let outcome = session.submit_upload().await;
    drop(session);
    let _ = printer.await;

    match outcome? {
        UploadOutcome::Succeeded {
            watch_url: Some(url),
            ..
        } => {
            println!("{}", url);
            Ok(())
        }
        UploadOutcome::Succeeded { watch_url: None, .. } => Ok(()),
        UploadOutcome::Failed { reason } => anyhow::bail!(reason),
    }
}
