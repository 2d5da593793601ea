use {
    clap::Parser,
    fire_block_machine::{
        error::{LineSourceError, ReaderError},
        logger::TracingLogger,
        pb::Block,
        reader::{
            BlockObserver, ConsoleReader, line_channel, pump_lines_with_tee, spawn_block_stream,
        },
    },
    fire_block_reader::{
        node_log::NodeLogForwarder,
        output::{BlockSummary, DecodeTrxError, TransactionView, decode_transaction},
        settings::{Settings, SettingsError},
    },
    std::{
        io::Write,
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
    },
    tokio::{
        io::{AsyncRead, BufReader},
        sync::mpsc,
    },
    tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt},
};

pub fn init_tracing() {
    let io_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let level_layer = EnvFilter::builder().from_env_lossy();
    tracing_subscriber::registry()
        .with(io_layer)
        .with(level_layer)
        .try_init()
        .expect("tracing init");
}

#[derive(Debug, clap::Parser)]
#[clap(
    author,
    version,
    about = "Reads Firehose instrumented node output and extracts its blocks"
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Reads a node console log and prints one JSON line per block.
    Read {
        /// Console log to read, standard input when omitted.
        #[clap(long)]
        input: Option<PathBuf>,
        /// YAML settings file.
        #[clap(long)]
        config: Option<PathBuf>,
        /// Overrides `reader.first_streamable_block` of the settings.
        #[clap(long)]
        first_streamable_block: Option<u64>,
    },
    /// Decodes base64 (standard, padded) encoded transactions and prints them as JSON.
    DecodeTrx {
        #[clap(required = true)]
        inputs: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    LineSource(#[from] LineSourceError),
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error(transparent)]
    DecodeTrx(#[from] DecodeTrxError),
    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),
    #[error("rendering output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line pump task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

async fn pump_source<R>(
    source: R,
    lines: mpsc::Sender<String>,
    forwarder: Option<NodeLogForwarder>,
) -> Result<(), LineSourceError>
where
    R: AsyncRead + Unpin,
{
    pump_lines_with_tee(BufReader::new(source), lines, |line| {
        if let Some(forwarder) = &forwarder {
            forwarder.forward(line);
        }
    })
    .await
}

async fn pump_input(
    input: Option<PathBuf>,
    lines: mpsc::Sender<String>,
    forwarder: Option<NodeLogForwarder>,
) -> Result<(), LineSourceError> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            pump_source(file, lines, forwarder).await
        }
        None => pump_source(tokio::io::stdin(), lines, forwarder).await,
    }
}

async fn read(
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    first_streamable_block: Option<u64>,
) -> Result<(), CliError> {
    let mut settings = match config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(first_streamable_block) = first_streamable_block {
        settings.reader.first_streamable_block = first_streamable_block;
    }

    let forwarder = settings
        .forward_node_logs
        .then(|| NodeLogForwarder::new(settings.debug_firehose_logs));
    let (tx, rx) = line_channel(settings.reader.line_buffer_capacity);
    let pump = tokio::spawn(pump_input(input, tx, forwarder));

    let reader = ConsoleReader::new(rx, Arc::new(TracingLogger), &settings.reader);
    let first_streamable_block = reader.first_streamable_block();

    let block_count = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&block_count);
    let observers: Vec<Box<dyn BlockObserver>> = vec![Box::new(move |_: &Block| {
        counter.fetch_add(1, Ordering::Relaxed);
    })];
    let mut blocks = spawn_block_stream(
        reader,
        settings.reader.output_channel_capacity,
        observers,
    );

    let mut out = std::io::stdout().lock();
    let mut failure = None;
    while let Some(result) = blocks.recv().await {
        match result {
            Ok(block) => {
                let summary = BlockSummary::new(&block, first_streamable_block);
                serde_json::to_writer(&mut out, &summary)?;
                writeln!(out)?;
            }
            Err(e) => failure = Some(e),
        }
    }
    out.flush()?;

    tracing::info!("read {} blocks", block_count.load(Ordering::Relaxed));

    if let Some(e) = failure {
        return Err(e.into());
    }
    pump.await??;
    Ok(())
}

fn decode_trx(inputs: &[String]) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    for input in inputs {
        let transaction = decode_transaction(input)?;
        serde_json::to_writer_pretty(&mut out, &TransactionView::from(&transaction))?;
        writeln!(out)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_tracing();
    let args = Args::parse();
    match args.command {
        Command::Read {
            input,
            config,
            first_streamable_block,
        } => read(input, config, first_streamable_block).await,
        Command::DecodeTrx { inputs } => decode_trx(&inputs),
    }
}
