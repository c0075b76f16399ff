#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::process::ExitCode;

use args::Args;
use axon_config::Config;
use axon_llm::{CompletionHandler, ConversationTurn, MessageOptions, ModelCatalog, ModelSelection, StreamEvent};
use clap::Parser;
use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    axon_telemetry::init(config.telemetry.as_ref(), "warn")?;

    let resolved = config.resolve()?;
    let catalog = ModelCatalog::builtin().with_profiles(&config.models);
    let handler = CompletionHandler::new(resolved, &catalog)?;

    let selection = handler.get_model();
    if args.show_model {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(
        config_path = %args.config.display(),
        provider = %handler.config().provider,
        model = %selection.id,
        "starting completion"
    );

    // Abandon the stream on Ctrl+C
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_clone.cancel();
        }
    });

    let system_prompt = args.system.as_deref().unwrap_or(&handler.config().system_prompt);
    let history = [ConversationTurn::user(args.prompt.join(" "))];
    let options = MessageOptions {
        include_max_tokens: true,
        ..MessageOptions::default()
    };

    let mut events = handler.create_message(system_prompt, &history, &options);
    let mut out = tokio::io::stdout();

    loop {
        let event = tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!("interrupted, closing connection");
                return Ok(ExitCode::from(130));
            }
            event = events.next() => event,
        };

        let Some(event) = event else {
            break;
        };

        if args.json {
            let mut line = serde_json::to_vec(&event)?;
            line.push(b'\n');
            out.write_all(&line).await?;
            out.flush().await?;
        }

        match event {
            StreamEvent::Content(fragment) => {
                if !args.json {
                    out.write_all(fragment.text.as_bytes()).await?;
                    out.flush().await?;
                }
            }
            StreamEvent::Usage(usage) => {
                tracing::info!(
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    cache_read_tokens = usage.cache_read_tokens,
                    cache_write_tokens = usage.cache_write_tokens,
                    cost_usd = selection.info.estimate_cost(&usage),
                    "completion usage"
                );
            }
            StreamEvent::Done => {
                finish_line(&mut out, args.json).await?;
                return Ok(ExitCode::SUCCESS);
            }
            StreamEvent::Error { kind, message } => {
                finish_line(&mut out, args.json).await?;
                report_error(&selection, kind, &message);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn finish_line(out: &mut Stdout, json: bool) -> std::io::Result<()> {
    if !json {
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

fn report_error(selection: &ModelSelection, kind: axon_llm::ErrorKind, message: &str) {
    tracing::error!(model = %selection.id, kind = %kind, error = %message, "completion failed");
    eprintln!("error ({kind}): {message}");
}
