use {
    fire_block_machine::tokenizer::LOG_PREFIX,
    regex::Regex,
    std::{borrow::Cow, sync::LazyLock},
    tracing::Level,
};

const TARGET: &str = "fire_reader::node";

static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[0123][0-9]{3}-[0-9]{1,2}-[0-9]{1,2}T[0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2}\.[0-9]+Z",
        r"\s*(\[.*\])?\s*",
        r"(ERROR|WARNING|WARN|DEBUG|INFO|error|warning|warn|debug|info)\s*(.*)",
    ))
    .expect("valid node log line regex")
});

static PANIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^thread '.*' panicked").expect("valid panic line regex"));

///
/// A line of the node's own logging, as far as it can be understood.
///
/// Node lines look like `2022-08-13T17:33:13.498748Z [api] INFO message`. Anything else is kept
/// verbatim at `INFO`, except panics which are errors.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLogLine<'a> {
    pub level: Level,
    pub module: Option<&'a str>,
    pub message: &'a str,
    matched: bool,
}

impl<'a> NodeLogLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        // The module group is greedy, the longest bracketed prefix followed by a level wins
        if let Some(captures) = LOG_LINE.captures(line) {
            let level = captures
                .get(2)
                .map_or(Level::DEBUG, |level| level_from_name(level.as_str()));
            return Self {
                level,
                module: captures.get(1).map(|module| module.as_str()),
                message: captures.get(3).map_or("", |message| message.as_str()),
                matched: true,
            };
        }

        let level = if PANIC_LINE.is_match(line) {
            Level::ERROR
        } else {
            Level::INFO
        };
        Self {
            level,
            module: None,
            message: line,
            matched: false,
        }
    }

    ///
    /// The line with its timestamp and level removed, `[module] message`.
    ///
    pub fn stripped(&self) -> Cow<'a, str> {
        match (self.matched, self.module) {
            (true, Some(module)) => Cow::Owned(format!("{module} {}", self.message)),
            _ => Cow::Borrowed(self.message),
        }
    }
}

fn level_from_name(name: &str) -> Level {
    match name {
        "error" | "ERROR" => Level::ERROR,
        "warn" | "warning" | "WARN" | "WARNING" => Level::WARN,
        "info" | "INFO" => Level::INFO,
        _ => Level::DEBUG,
    }
}

///
/// Re-emits the node's output into our own `tracing` pipeline.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeLogForwarder {
    /// Also forward the `FIRE` protocol lines, extremely verbose.
    pub debug_firehose_logs: bool,
}

impl NodeLogForwarder {
    pub fn new(debug_firehose_logs: bool) -> Self {
        Self {
            debug_firehose_logs,
        }
    }

    pub fn should_forward(&self, line: &str) -> bool {
        self.debug_firehose_logs || !line.starts_with(LOG_PREFIX)
    }

    pub fn forward(&self, line: &str) {
        if !self.should_forward(line) {
            return;
        }

        let parsed = NodeLogLine::parse(line);
        let message = parsed.stripped();
        if parsed.level == Level::ERROR {
            tracing::error!(target: TARGET, "{message}");
        } else if parsed.level == Level::WARN {
            tracing::warn!(target: TARGET, "{message}");
        } else if parsed.level == Level::DEBUG {
            tracing::debug!(target: TARGET, "{message}");
        } else {
            tracing::info!(target: TARGET, "{message}");
        }
    }
}
