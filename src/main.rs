use clap::{Args, Parser, Subcommand};
use idcard_render::cdp::CdpEngine;
use idcard_render::provision::Provision;
use idcard_render::server::Server;
use idcard_render::{CardHandler, CardRenderer, Error, LaunchConfig, RenderConfig, RenderRequest, Result};
use log::{error, info};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "idcard-render", version, about = "Render HTML fragments into ID-card PDFs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the render endpoint over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "CARD_LISTEN", default_value = "0.0.0.0:3000")]
        listen: String,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long, env = "CARD_WORKERS")]
        workers: Option<usize>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Render a single card to a file
    Render {
        /// HTML fragment to render ("-" reads stdin)
        #[arg(long, short)]
        input: PathBuf,
        /// Output path (defaults to the card filename)
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,
    /// Extra switch passed to the browser (repeatable)
    #[arg(long = "chrome-arg", allow_hyphen_values = true)]
    chrome_args: Vec<String>,
    /// Use the sandbox-less switch set for function hosts
    #[arg(long, env = "CARD_SERVERLESS")]
    serverless: bool,
    /// Deadline for external fonts and styles to finish loading
    #[arg(long, env = "CARD_TIMEOUT_MS", default_value_t = 10_000)]
    timeout_ms: u64,
    /// Largest accepted request body
    #[arg(long, env = "CARD_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    max_body_bytes: usize,
}

impl EngineArgs {
    /// Split the flags into the browser launch settings and the per-render settings.
    fn into_configs(self) -> Result<(LaunchConfig, RenderConfig)> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }
        let mut config = RenderConfig::default();
        config.wait.timeout = Duration::from_millis(self.timeout_ms);
        config.max_body_bytes = self.max_body_bytes;

        let preset = if self.serverless {
            Provision::serverless()
        } else {
            Provision::local()
        };
        let mut launch = LaunchConfig::default();
        preset
            .with_executable(self.chrome_path)
            .with_args(self.chrome_args)
            .apply(&mut launch);
        Ok((launch, config))
    }

    fn into_renderer(self) -> Result<CardRenderer<CdpEngine>> {
        let (launch, config) = self.into_configs()?;
        Ok(CardRenderer::new(CdpEngine::new(launch), config))
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve {
            listen,
            workers,
            engine,
        } => {
            let workers = workers.unwrap_or_else(num_cpus::get);
            let handler = CardHandler::new(engine.into_renderer()?);
            Server::bind(&listen, handler, workers)?.run()
        }
        Command::Render {
            input,
            output,
            engine,
        } => {
            let html = if input.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&input)?
            };
            let request = RenderRequest::new(html)?;
            let card = engine.into_renderer()?.render(&request.html)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&card.filename));
            std::fs::write(&output, &card.bytes)?;
            info!("wrote {} bytes to {}", card.bytes.len(), output.display());
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
