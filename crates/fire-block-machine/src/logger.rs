use {std::fmt, tracing::Level};

/// A structured key/value pair attached to a log record.
pub type Field<'a> = (&'static str, &'a dyn fmt::Display);

///
/// Narrow structured logging interface handed to the reader at construction.
///
/// The reader never logs through ambient state, every protocol level message goes through the
/// instance it was built with.
///
pub trait Logger: Send + Sync {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]);

    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        if self.enabled(Level::DEBUG) {
            self.log(Level::DEBUG, message, fields);
        }
    }

    fn info(&self, message: &str, fields: &[Field<'_>]) {
        if self.enabled(Level::INFO) {
            self.log(Level::INFO, message, fields);
        }
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        if self.enabled(Level::WARN) {
            self.log(Level::WARN, message, fields);
        }
    }
}

/// Renders fields as `key=value` separated by spaces.
pub struct DisplayFields<'a, 'b>(pub &'a [Field<'b>]);

impl fmt::Display for DisplayFields<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

///
/// [`Logger`] forwarding to `tracing` under the `fire_block_machine::reader` target.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

const TARGET: &str = "fire_block_machine::reader";

impl Logger for TracingLogger {
    fn enabled(&self, level: Level) -> bool {
        if level == Level::TRACE {
            tracing::enabled!(target: TARGET, Level::TRACE)
        } else if level == Level::DEBUG {
            tracing::enabled!(target: TARGET, Level::DEBUG)
        } else if level == Level::INFO {
            tracing::enabled!(target: TARGET, Level::INFO)
        } else if level == Level::WARN {
            tracing::enabled!(target: TARGET, Level::WARN)
        } else {
            tracing::enabled!(target: TARGET, Level::ERROR)
        }
    }

    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let fields = DisplayFields(fields);
        if level == Level::TRACE {
            tracing::trace!(target: TARGET, %fields, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: TARGET, %fields, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: TARGET, %fields, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: TARGET, %fields, "{message}");
        } else {
            tracing::error!(target: TARGET, %fields, "{message}");
        }
    }
}
