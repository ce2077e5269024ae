//! CLI consumer for the blocks provider streaming API.

use std::time::Duration;

use blocksapi_client::shutdown;
use blocksapi_client::stream::client::{BlocksClient, StreamClientError};
use blocksapi_client::stream::policy::StreamOptions;
use blocksapi_client::stream::session::{Dispatcher, RunOutcome, StreamSession};
use clap::Parser;
use secrecy::SecretString;
use tracing::{error, info};

/// Environment variable holding the bearer token, if any.
const TOKEN_ENV_VAR: &str = "BLOCKSAPI_TOKEN";

#[derive(Debug, Parser)]
#[command(
    name = "blocks-consumer",
    about = "Consume a block stream from a blocks provider",
    version
)]
struct Args {
    /// gRPC endpoint address.
    #[arg(long, default_value = "http://localhost:4300")]
    server: String,

    /// Stream name.
    #[arg(long, default_value = "v2_mainnet_near_blocks")]
    stream: String,

    /// Start on the latest block in the stream.
    #[arg(long)]
    start_on_latest: bool,

    /// Start exactly on the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    start_exactly_on: u64,

    /// Start exactly after the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    start_exactly_after: u64,

    /// Start on the block closest to the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    start_on: u64,

    /// Start on the earliest block after the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    start_after: u64,

    /// Stop before the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    stop_before: u64,

    /// Stop after the given height (0 means unset).
    #[arg(long, default_value_t = 0, value_name = "HEIGHT")]
    stop_after: u64,

    /// Exclude block payloads from responses (headers only).
    #[arg(long)]
    exclude_payload: bool,

    /// Allow catchup and wait for it.
    #[arg(long)]
    wait_catchup: bool,

    /// Allow catchup and stream it.
    #[arg(long)]
    stream_catchup: bool,

    /// Exclude block payloads from catchup responses (headers only).
    #[arg(long)]
    exclude_catchup_payload: bool,

    /// Log delivery speed every N seconds (0 disables).
    #[arg(long, default_value_t = 0, value_name = "SECONDS")]
    log_speed: u64,
}

impl Args {
    fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            stream_name: self.stream.clone(),
            start_on_latest: self.start_on_latest,
            start_exactly_on: self.start_exactly_on,
            start_exactly_after: self.start_exactly_after,
            start_on: self.start_on,
            start_after: self.start_after,
            stop_before: self.stop_before,
            stop_after: self.stop_after,
            exclude_payload: self.exclude_payload,
            wait_catchup: self.wait_catchup,
            stream_catchup: self.stream_catchup,
            exclude_catchup_payload: self.exclude_catchup_payload,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(RunOutcome::Completed) => info!("finished"),
        Ok(RunOutcome::Interrupted) => info!("interrupted, shut down cleanly"),
        Err(err) => {
            error!(%err, "finished with error");
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<RunOutcome, StreamClientError> {
    let token = std::env::var(TOKEN_ENV_VAR)
        .ok()
        .filter(|token| !token.is_empty())
        .map(SecretString::new);

    let client = BlocksClient::new(args.server.clone()).with_auth_token(token);
    let cancel = shutdown::termination_token();
    let dispatcher = Dispatcher::new(Duration::from_secs(args.log_speed));
    let request = args.stream_options().build_request();

    let mut session = StreamSession::open(&client, request, dispatcher, cancel).await?;
    let outcome = session.run().await;
    info!(
        messages = session.dispatcher().messages_dispatched(),
        "session closed"
    );
    outcome
}
