use {
    crate::{
        block::{StreamBlock, StreamHeader},
        config::ReaderConfig,
        error::{LineSourceError, ReaderError},
        logger::Logger,
        pb::Block,
        state_machine::ConsoleReaderSM,
        stats::{ReaderStats, StatsReporter},
    },
    derive_more::From,
    futures_util::{Sink, SinkExt},
    std::sync::Arc,
    tokio::{
        io::{AsyncBufRead, AsyncBufReadExt},
        sync::mpsc,
    },
    tokio_util::sync::PollSender,
};

pub type ReaderResult = Result<Block, ReaderError>;

///
/// Bounded queue carrying raw console lines to a [`ConsoleReader`].
///
/// The queue closes once every sender is dropped, which the reader sees as end-of-stream.
///
pub fn line_channel(capacity: usize) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
    mpsc::channel(capacity.max(1))
}

///
/// Forwards every line of `source` into `lines` until EOF.
///
pub async fn pump_lines<R>(source: R, lines: mpsc::Sender<String>) -> Result<(), LineSourceError>
where
    R: AsyncBufRead + Unpin,
{
    pump_lines_with_tee(source, lines, |_| {}).await
}

///
/// Same as [`pump_lines`] but hands each line to `tee` before queueing it.
///
/// Stops early without error when the receiving side went away. `lines` is dropped on return so
/// the reader observes end-of-stream once the queue is drained.
///
pub async fn pump_lines_with_tee<R, F>(
    source: R,
    lines: mpsc::Sender<String>,
    mut tee: F,
) -> Result<(), LineSourceError>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str),
{
    let mut source = source.lines();
    while let Some(line) = source.next_line().await? {
        tee(&line);
        if lines.send(line).await.is_err() {
            tracing::debug!("console reader dropped its line queue, stopping line pump");
            break;
        }
    }
    Ok(())
}

///
/// Reads blocks out of a queue of console lines.
///
/// This is the async face of [`ConsoleReaderSM`]: [`ConsoleReader::read_block`] pulls lines until
/// one completes a block, and suspends while the queue is empty.
///
pub struct ConsoleReader {
    lines: mpsc::Receiver<String>,
    machine: ConsoleReaderSM,
    logger: Arc<dyn Logger>,
    first_streamable_block: u64,
    reporter: Option<StatsReporter>,
}

impl ConsoleReader {
    ///
    /// Creates a reader consuming `lines`.
    ///
    /// When `config.log_stats` is set, the statistics reporter is spawned on the current tokio
    /// runtime, hence this must be called from within one.
    ///
    pub fn new(
        lines: mpsc::Receiver<String>,
        logger: Arc<dyn Logger>,
        config: &ReaderConfig,
    ) -> Self {
        let stats = Arc::new(ReaderStats::new());
        let reporter = config.log_stats.then(|| {
            StatsReporter::spawn_logging(
                Arc::clone(&stats),
                config.stats_log_interval(),
                Arc::clone(&logger),
            )
        });

        Self {
            lines,
            machine: ConsoleReaderSM::new(Arc::clone(&logger), stats),
            logger,
            first_streamable_block: config.first_streamable_block,
            reporter,
        }
    }

    pub fn header(&self) -> Option<&StreamHeader> {
        self.machine.header()
    }

    pub fn stats(&self) -> &Arc<ReaderStats> {
        self.machine.stats()
    }

    pub fn first_streamable_block(&self) -> u64 {
        self.first_streamable_block
    }

    ///
    /// Returns the next completed block, `Ok(None)` once the line queue is closed and drained.
    ///
    /// A block still being accumulated at end-of-stream is discarded. After an error the reader
    /// should not be used anymore.
    ///
    pub async fn read_block(&mut self) -> Result<Option<Block>, ReaderError> {
        while let Some(line) = self.lines.recv().await {
            if let Some(block) = self.machine.process_line(&line)? {
                return Ok(Some(block));
            }
        }

        if let Some(height) = self.machine.discard_pending() {
            self.logger.info(
                "discarding incomplete block at end of stream",
                &[("active_block_height", &height)],
            );
        }
        self.logger.info("lines channel has been closed", &[]);
        Ok(None)
    }

    ///
    /// Like [`ConsoleReader::read_block`] but wraps the block for the block streaming pipeline.
    ///
    pub async fn read_stream_block(&mut self) -> Result<Option<StreamBlock>, ReaderError> {
        let block = self.read_block().await?;
        Ok(block.map(|block| block.to_stream_block(self.first_streamable_block)))
    }

    ///
    /// Stops the statistics reporter. Lines still queued are left unread.
    ///
    pub async fn close(&mut self) {
        self.lines.close();
        if let Some(reporter) = self.reporter.take() {
            reporter.shutdown().await;
        }
    }
}

///
/// Gets a look at every completed block before it is handed to the sink.
///
pub trait BlockObserver: Send {
    fn on_block_completed(&mut self, block: &Block);
}

impl<F> BlockObserver for F
where
    F: FnMut(&Block) + Send,
{
    fn on_block_completed(&mut self, block: &Block) {
        self(block)
    }
}

///
/// Connects a [`ConsoleReader`] to a sink of [`ReaderResult`].
///
/// Every block goes through the registered observers and then into the sink. The first error is
/// forwarded to the sink as well and ends the run, so does the end of the line queue.
///
pub struct ConsoleReaderDriver<Sink> {
    reader: ConsoleReader,
    sink: Sink,
    observers: Vec<Box<dyn BlockObserver>>,
}

#[derive(Debug, thiserror::Error, From)]
pub enum DriverError<SnkErr> {
    #[error(transparent)]
    SinkError(SnkErr),
}

impl<Snk, SnkErr> ConsoleReaderDriver<Snk>
where
    Snk: Sink<ReaderResult, Error = SnkErr> + Unpin + Send + 'static,
    SnkErr: std::error::Error + Send,
{
    pub fn new(reader: ConsoleReader, sink: Snk) -> Self {
        Self {
            reader,
            sink,
            observers: Vec::new(),
        }
    }

    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: BlockObserver + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    async fn forward_blocks(&mut self) -> Result<(), DriverError<SnkErr>> {
        loop {
            match self.reader.read_block().await {
                Ok(Some(block)) => {
                    for observer in self.observers.iter_mut() {
                        observer.on_block_completed(&block);
                    }
                    self.sink.send(Ok(block)).await?;
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    tracing::error!("console reader stopped: {e}");
                    self.sink.send(Err(e)).await?;
                    return Ok(());
                }
            }
        }
    }

    pub async fn run(mut self) -> Result<(), DriverError<SnkErr>> {
        let result = self.forward_blocks().await;
        self.reader.close().await;
        result
    }
}

///
/// Spawns a driver over `reader` and returns the receiving end of its output.
///
/// The receiver yields every block, then at most one error, then closes.
///
pub fn spawn_block_stream(
    reader: ConsoleReader,
    capacity: usize,
    observers: Vec<Box<dyn BlockObserver>>,
) -> mpsc::Receiver<ReaderResult> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let mut driver = ConsoleReaderDriver::new(reader, PollSender::new(tx));
    driver.observers = observers;

    tokio::spawn(async move {
        if let Err(e) = driver.run().await {
            tracing::debug!("block stream receiver dropped: {e}");
        }
    });

    rx
}
