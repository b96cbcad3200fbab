use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use uni_gpt::api::ApiServerBuilder;
use uni_gpt::conversation::{Input, StatusUpdate, TokioScheduler};
use uni_gpt::relay::HttpRelayClient;
use uni_gpt::voice::{ConsoleRecognizer, ConsoleSynthesizer};
use uni_gpt::{Config, Controller};

/// Uni-GPT - voice assistant relay and conversation controller
#[derive(Parser)]
#[command(name = "uni-gpt", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "UNIGPT_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chat relay HTTP server (default)
    Serve,
    /// Talk to the assistant from the terminal
    Chat {
        /// Re-listen automatically after each reply
        #[arg(long)]
        continuous: bool,

        /// Call the completion provider in-process instead of over HTTP
        #[arg(long)]
        direct: bool,

        /// Relay base URL (overrides config)
        #[arg(long, env = "UNIGPT_RELAY_URL")]
        relay_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Chat output shares the terminal, so keep it quiet unless asked
    let chatting = matches!(cli.command, Some(Command::Chat { .. }));
    let filter = match (cli.verbose, chatting) {
        (0, true) => "warn",
        (0, false) => "info,uni_gpt=info",
        (1, _) => "info,uni_gpt=debug",
        (2, _) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cmd_serve(config).await,
        Command::Chat {
            continuous,
            direct,
            relay_url,
        } => {
            if let Some(url) = relay_url {
                config.conversation.relay_url = url;
            }
            config.conversation.continuous |= continuous;
            cmd_chat(config, direct).await
        }
    }
}

async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    let relay = config.build_relay()?;

    tracing::info!(
        port = config.server.port,
        model = %config.provider.model,
        "starting chat relay"
    );

    let server = ApiServerBuilder::new(relay, config.server.port)
        .static_dir(config.server.static_dir.clone())
        .build();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

async fn cmd_chat(config: Config, direct: bool) -> anyhow::Result<()> {
    let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();

    let recognizer = ConsoleRecognizer::new(lines_rx, inputs_tx.clone());
    let synthesizer = ConsoleSynthesizer::new(inputs_tx.clone());
    let scheduler = TokioScheduler::new(inputs_tx.clone());
    let controller_config = config.conversation.controller_config();
    let continuous = controller_config.continuous;

    let controller = if direct {
        Controller::new(
            recognizer,
            synthesizer,
            config.build_relay()?,
            scheduler,
            controller_config,
        )
    } else {
        tracing::info!(relay = %config.conversation.relay_url, "using HTTP relay");
        Controller::new(
            recognizer,
            synthesizer,
            HttpRelayClient::new(&config.conversation.relay_url),
            scheduler,
            controller_config,
        )
    };
    let controller = controller.with_status_sink(status_tx);

    println!("Uni-GPT. Type a message, or /reset, /continuous, /quit.");
    let printer = tokio::spawn(print_status(status_rx));

    tokio::select! {
        () = controller.run(inputs_rx) => {}
        result = read_commands(lines_tx, inputs_tx, continuous) => result?,
    }

    printer.abort();
    Ok(())
}

/// Forward typed lines to the controller until `/quit` or end of input
async fn read_commands(
    lines: mpsc::UnboundedSender<String>,
    inputs: mpsc::UnboundedSender<Input>,
    mut continuous: bool,
) -> anyhow::Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = stdin.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/reset" => {
                let _ = inputs.send(Input::Reset);
                println!("(conversation cleared)");
            }
            "/continuous" => {
                continuous = !continuous;
                let _ = inputs.send(Input::SetContinuous(continuous));
                println!("(continuous mode {})", if continuous { "on" } else { "off" });
            }
            text => {
                // Queue the transcript first so the session started by Activate finds it
                let _ = lines.send(text.to_string());
                let _ = inputs.send(Input::Activate);
            }
        }
    }

    Ok(())
}

async fn print_status(mut updates: mpsc::UnboundedReceiver<StatusUpdate>) {
    let mut last = String::new();
    while let Some(update) = updates.recv().await {
        if update.status != last {
            eprintln!("[{}]", update.status);
            last = update.status;
        }
    }
}
