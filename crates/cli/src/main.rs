use std::sync::Arc;

use clap::Parser;
use flowbot::clock::TokioClock;
use flowbot::config::Settings;
use flowbot::{Workflow, WorkflowRequest};
use flowbot_cdp::CdpLauncher;
use flowbot_cli::cli::{Cli, Commands};
use flowbot_cli::logging;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut settings = Settings::from_env();
    if cli.headless {
        settings.headless = true;
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target = "flowbot", "interrupt received, shutting down");
            interrupt.cancel();
        }
    });

    let workflow = Workflow::new(
        Arc::new(CdpLauncher::new(settings.clone())),
        Arc::new(TokioClock),
        settings.clone(),
    );

    let outcome = match cli.command {
        Commands::Run { prompt, output, skip_login } => {
            let request = WorkflowRequest {
                prompt: prompt.unwrap_or_else(|| settings.default_prompt.clone()),
                output_filename: output,
                skip_login,
            };
            workflow.run(request, cancel).await.map(|result| {
                println!("{}", result.file_path.display());
            })
        }
        Commands::Interactive => workflow.interactive(cancel).await,
    };

    if let Err(err) = outcome {
        error!(target = "flowbot", error = %err, "workflow failed");
        std::process::exit(1);
    }
}
