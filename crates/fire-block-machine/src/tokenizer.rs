use crate::error::ProtocolError;

/// Marker distinguishing protocol lines from the rest of the node output.
pub const LOG_PREFIX: &str = "FIRE";

pub const LOG_INIT: &str = "INIT";
pub const LOG_BLOCK_START: &str = "BLOCK_START";
pub const LOG_TRX: &str = "TRX";
pub const LOG_BLOCK_END: &str = "BLOCK_END";

///
/// A protocol line split into its event kind and raw parameters.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent<'a> {
    Init(Vec<&'a str>),
    BlockStart(Vec<&'a str>),
    Transaction(Vec<&'a str>),
    BlockEnd(Vec<&'a str>),
    Unknown { tag: &'a str, params: Vec<&'a str> },
}

impl<'a> ProtocolEvent<'a> {
    pub fn tag(&self) -> &'a str {
        match self {
            Self::Init(_) => LOG_INIT,
            Self::BlockStart(_) => LOG_BLOCK_START,
            Self::Transaction(_) => LOG_TRX,
            Self::BlockEnd(_) => LOG_BLOCK_END,
            Self::Unknown { tag, .. } => tag,
        }
    }

    pub fn params(&self) -> &[&'a str] {
        match self {
            Self::Init(params)
            | Self::BlockStart(params)
            | Self::Transaction(params)
            | Self::BlockEnd(params)
            | Self::Unknown { params, .. } => params,
        }
    }
}

///
/// Splits `line` into a [`ProtocolEvent`].
///
/// Returns `Ok(None)` when the line is not a protocol line at all.
///
/// Parameters never contain spaces (binary values are base64 encoded by the node), so a naive split
/// on single spaces is enough. Consecutive spaces yield empty parameters which are then rejected by
/// the per-event arity checks.
///
pub fn tokenize(line: &str) -> Result<Option<ProtocolEvent<'_>>, ProtocolError> {
    let Some(rest) = line.strip_prefix(LOG_PREFIX) else {
        return Ok(None);
    };

    let rest = match rest.strip_prefix(' ') {
        Some(rest) => rest,
        // `FIRE` alone is a protocol line with nothing in it
        None if rest.is_empty() => return Err(ProtocolError::MalformedLine),
        // Some other word sharing the prefix, e.g. `FIREWALL ...`
        None => return Ok(None),
    };

    let mut tokens = rest.split(' ');
    let tag = tokens.next().unwrap_or_default();
    let params: Vec<&str> = tokens.collect();
    if params.is_empty() {
        return Err(ProtocolError::MalformedLine);
    }

    let event = match tag {
        LOG_INIT => ProtocolEvent::Init(params),
        LOG_BLOCK_START => ProtocolEvent::BlockStart(params),
        LOG_TRX => ProtocolEvent::Transaction(params),
        LOG_BLOCK_END => ProtocolEvent::BlockEnd(params),
        _ => ProtocolEvent::Unknown { tag, params },
    };
    Ok(Some(event))
}

pub(crate) fn expect_params(
    event: &'static str,
    params: &[&str],
    counts: &[usize],
) -> Result<(), ProtocolError> {
    if counts.contains(&params.len()) {
        return Ok(());
    }

    Err(ProtocolError::InvalidParamCount {
        event,
        expected: counts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or "),
        found: params.len(),
    })
}

pub(crate) fn parse_u64(
    event: &'static str,
    field: &'static str,
    value: &str,
) -> Result<u64, ProtocolError> {
    value
        .parse::<u64>()
        .map_err(|source| ProtocolError::InvalidNumber {
            event,
            field,
            value: value.to_owned(),
            source,
        })
}
