use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use voice_interview::{
    create_router, AppState, Config, InterviewSession, NarrationMode, NatsClient,
    SpeechSourceKind,
};

/// Voice or text guided interview service
#[derive(Parser, Debug)]
#[command(name = "voice-interview", version, about)]
struct Cli {
    /// Path to the configuration file (extension optional)
    #[arg(short = 'c', long = "config", global = true, default_value = "config/voice-interview")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Run one text-only interview in the terminal
    Chat,
    /// Validate the question graph and print the question chain
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output (chat prompts, question chain)
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    info!("Voice Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let graph = Arc::new(cfg.question_graph().context("Invalid question graph")?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cfg, graph).await,
        Command::Chat => chat(&cfg, graph).await,
        Command::Check => {
            for (position, question) in graph.iter().enumerate() {
                println!("{:>2}. [{}] {}", position + 1, question.id, question.text);
            }
            Ok(())
        }
    }
}

async fn serve(cfg: &Config, graph: Arc<voice_interview::QuestionGraph>) -> Result<()> {
    let session_defaults = cfg.session_config(None);

    let nats_client = if session_defaults.needs_nats() {
        Some(Arc::new(NatsClient::connect(&cfg.nats.url).await?))
    } else {
        None
    };

    let state = AppState::new(graph, session_defaults, nats_client);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn chat(cfg: &Config, graph: Arc<voice_interview::QuestionGraph>) -> Result<()> {
    let mut session_config = cfg.session_config(None);
    session_config.speech_source = SpeechSourceKind::Disabled;
    session_config.narration = NarrationMode::Silent;

    let (session, handle) = InterviewSession::build(session_config, graph, None).await?;
    let task = session.spawn();

    let first = handle.start_conversation().await?;
    println!("Assistant: {}", first.text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while handle.current_question().is_some() {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        if let Some(exchange) = handle.handle_response(&line).await? {
            println!("Assistant: {}", exchange.assistant.text);
        }
    }

    let stats = handle.shutdown().await?;
    task.await?;

    info!(
        "Interview finished: {} answered, {} retries, {} messages",
        stats.answered, stats.retries, stats.messages
    );

    Ok(())
}
