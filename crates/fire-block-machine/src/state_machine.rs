use {
    crate::{
        assembler::{BlockAssembler, FinalizedBlock, PendingBlock},
        block::StreamHeader,
        error::{ProtocolError, ReaderError},
        logger::Logger,
        pb::{Block, Transaction},
        stats::ReaderStats,
        tokenizer::{
            LOG_BLOCK_END, LOG_BLOCK_START, LOG_INIT, LOG_TRX, ProtocolEvent, expect_params,
            parse_u64, tokenize,
        },
    },
    base64::{Engine, engine::general_purpose::STANDARD},
    prost::Message,
    std::{sync::Arc, time::Instant},
};

/// Only protocol major version this reader understands.
pub const SUPPORTED_MAJOR_VERSION: u64 = 0;

const CHAIN_ID_PARAM_NAME: &str = "chain_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    ///
    /// No `FIRE INIT` seen yet, every other protocol line is dropped.
    ///
    AwaitingHeader,
    ///
    /// Header read, blocks can flow. Whether a block is being accumulated is tracked by the
    /// [`BlockAssembler`].
    ///
    Ready(StreamHeader),
}

///
/// Sans-IO console reader.
///
/// Lines are pushed one at a time with [`ConsoleReaderSM::process_line`], which returns the block
/// completed by that line if any. The machine never blocks and never reads by itself, driving it
/// from a channel is done by [`crate::reader::ConsoleReader`].
///
/// # Protocol
///
/// ```text
/// FIRE INIT <client_name> <client_version> <fork> <major> <minor> [chain_id] <chain_id_value>
/// FIRE BLOCK_START <height>
/// FIRE TRX <base64 protobuf transaction>
/// ...
/// FIRE BLOCK_END <height>
/// ```
///
/// Any line not starting with `FIRE ` is node noise and is ignored.
///
pub struct ConsoleReaderSM {
    state: ReaderState,
    assembler: BlockAssembler,
    last_emitted_height: Option<u64>,
    stats: Arc<ReaderStats>,
    logger: Arc<dyn Logger>,
}

impl ConsoleReaderSM {
    pub fn new(logger: Arc<dyn Logger>, stats: Arc<ReaderStats>) -> Self {
        Self {
            state: ReaderState::AwaitingHeader,
            assembler: BlockAssembler::new(),
            last_emitted_height: None,
            stats,
            logger,
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn header(&self) -> Option<&StreamHeader> {
        match &self.state {
            ReaderState::AwaitingHeader => None,
            ReaderState::Ready(header) => Some(header),
        }
    }

    pub fn stats(&self) -> &Arc<ReaderStats> {
        &self.stats
    }

    pub fn is_accumulating(&self) -> bool {
        self.assembler.is_accumulating()
    }

    /// Height of the last block returned by this machine.
    pub fn last_emitted_height(&self) -> Option<u64> {
        self.last_emitted_height
    }

    ///
    /// Drops the block being accumulated, if any. Used when the line source ends mid block.
    ///
    pub fn discard_pending(&mut self) -> Option<u64> {
        self.assembler.discard().map(|pending| pending.height)
    }

    pub fn process_line(&mut self, line: &str) -> Result<Option<Block>, ReaderError> {
        self.process_line_with_clock(line, Instant::now())
    }

    pub fn process_line_with_clock(
        &mut self,
        line: &str,
        now: Instant,
    ) -> Result<Option<Block>, ReaderError> {
        let event = match tokenize(line) {
            Ok(Some(event)) => event,
            Ok(None) => return Ok(None),
            Err(e) => return Err(ReaderError::new(line, e)),
        };

        self.process_event(event, line, now)
            .map_err(|e| ReaderError::new(line, e))
    }

    fn process_event(
        &mut self,
        event: ProtocolEvent<'_>,
        line: &str,
        now: Instant,
    ) -> Result<Option<Block>, ProtocolError> {
        if let ReaderState::AwaitingHeader = self.state {
            if let ProtocolEvent::Init(params) = &event {
                let header = self.read_init(params)?;
                self.state = ReaderState::Ready(header);
            } else {
                self.logger.warn(
                    "received Firehose log line but we did not see 'FIRE INIT' yet, skipping",
                    &[("prefix", &event.tag())],
                );
            }
            return Ok(None);
        }

        match event {
            ProtocolEvent::Transaction(params) => {
                self.read_transaction(&params)?;
                Ok(None)
            }
            ProtocolEvent::BlockStart(params) => {
                self.read_block_start(&params, now)?;
                Ok(None)
            }
            ProtocolEvent::BlockEnd(params) => self.read_block_end(&params, now).map(Some),
            ProtocolEvent::Init(_) => Err(ProtocolError::DuplicateHeader),
            ProtocolEvent::Unknown { .. } => {
                self.logger
                    .debug("skipping unknown firehose log line", &[("line", &line)]);
                Ok(None)
            }
        }
    }

    fn chain_id(&self) -> u32 {
        self.header().map(|header| header.chain_id).unwrap_or_default()
    }

    // FIRE INIT <client_name> <client_version> <fork> <major> <minor> <chain_id>
    // FIRE INIT <client_name> <client_version> <fork> <major> <minor> chain_id <chain_id>
    fn read_init(&self, params: &[&str]) -> Result<StreamHeader, ProtocolError> {
        expect_params(LOG_INIT, params, &[6, 7])?;

        let major_version = parse_u64(LOG_INIT, "major_version", params[3])?;
        let minor_version = parse_u64(LOG_INIT, "minor_version", params[4])?;
        if major_version != SUPPORTED_MAJOR_VERSION {
            return Err(ProtocolError::UnsupportedMajorVersion {
                supported: SUPPORTED_MAJOR_VERSION,
                got: major_version,
            });
        }

        let chain_id_value = if params.len() == 6 {
            params[5]
        } else {
            if params[5] != CHAIN_ID_PARAM_NAME {
                return Err(ProtocolError::InvalidChainIdName {
                    got: params[5].to_owned(),
                });
            }
            params[6]
        };
        let chain_id = chain_id_value
            .parse::<u32>()
            .map_err(|source| ProtocolError::InvalidNumber {
                event: LOG_INIT,
                field: CHAIN_ID_PARAM_NAME,
                value: chain_id_value.to_owned(),
                source,
            })?;

        let header = StreamHeader {
            client_name: params[0].to_owned(),
            client_version: params[1].to_owned(),
            fork: params[2].to_owned(),
            major_version,
            minor_version,
            chain_id,
        };

        self.logger.info(
            "initialized console reader correctly",
            &[
                ("client_name", &header.client_name),
                ("client_version", &header.client_version),
                ("fork", &header.fork),
                ("firehose_major", &header.major_version),
                ("firehose_minor", &header.minor_version),
                ("chain_id", &header.chain_id),
            ],
        );
        Ok(header)
    }

    // FIRE BLOCK_START <height>
    fn read_block_start(&mut self, params: &[&str], now: Instant) -> Result<(), ProtocolError> {
        expect_params(LOG_BLOCK_START, params, &[1])?;
        let height = parse_u64(LOG_BLOCK_START, "height", params[0])?;

        let pending = PendingBlock::new_with_clock(height, self.chain_id(), now);
        if let Some(previous) = self.assembler.start(pending) {
            self.logger.info(
                "received BLOCK_START while one is already active, resetting active block and starting over",
                &[
                    ("previous_active_block_height", &previous.height),
                    ("new_active_block_height", &height),
                ],
            );
        }
        Ok(())
    }

    // FIRE TRX <base64 protobuf>
    fn read_transaction(&mut self, params: &[&str]) -> Result<(), ProtocolError> {
        expect_params(LOG_TRX, params, &[1])?;

        let Some(pending) = self.assembler.pending() else {
            return Err(ProtocolError::NoActiveBlock { event: LOG_TRX });
        };
        let height = pending.height;
        if pending.txn_len() == 0 {
            self.logger.debug(
                "received first transaction of block, ensuring its a valid first transaction",
                &[("active_block_height", &height)],
            );
        }

        let bytes = STANDARD
            .decode(params[0])
            .map_err(|source| ProtocolError::InvalidBase64 { height, source })?;
        let transaction = Transaction::decode(bytes.as_slice())
            .map_err(|source| ProtocolError::InvalidPayload { height, source })?;

        self.assembler.append(transaction)
    }

    // FIRE BLOCK_END <height>
    fn read_block_end(&mut self, params: &[&str], now: Instant) -> Result<Block, ProtocolError> {
        expect_params(LOG_BLOCK_END, params, &[1])?;
        let height = parse_u64(LOG_BLOCK_END, "height", params[0])?;

        // Blocks leave in non-decreasing height order, a resync cannot go back in time
        if let Some(last) = self.last_emitted_height.filter(|last| height < *last) {
            return Err(ProtocolError::HeightRegression {
                last,
                received: height,
            });
        }

        let FinalizedBlock { block, started_at } = self.assembler.finalize(height)?;
        self.last_emitted_height = Some(block.height);
        self.stats
            .record_block_completed_with_clock(&block, started_at, now);

        let id = block.id();
        let timestamp = block
            .time()
            .map(|time| time.to_rfc3339())
            .unwrap_or_default();
        self.logger.debug(
            "console reader node block",
            &[
                ("id", &id),
                ("height", &block.height),
                ("timestamp", &timestamp),
            ],
        );
        Ok(block)
    }
}

pub fn module_path_for_test() -> &'static str {
    module_path!()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::OrderingViolation,
            pb::{TransactionInfo, TransactionType, transaction::TxnData},
            testkit::{
                RecordingLogger, fire_block, fire_block_end, fire_block_start, fire_init,
                fire_init_custom, fire_trx, setup_tracing_test, transaction, ts,
            },
        },
        std::time::Duration,
        tracing::Level,
    };

    fn new_sm() -> (ConsoleReaderSM, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::new());
        let sm = ConsoleReaderSM::new(logger.clone(), Arc::new(ReaderStats::new()));
        (sm, logger)
    }

    ///
    /// Feeds every line, collecting completed blocks, stopping at the first error.
    ///
    fn feed<S: AsRef<str>>(
        sm: &mut ConsoleReaderSM,
        lines: &[S],
    ) -> Result<Vec<Block>, ReaderError> {
        let mut blocks = Vec::new();
        for line in lines {
            if let Some(block) = sm.process_line(line.as_ref())? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    fn genesis() -> Transaction {
        transaction(
            1,
            TransactionType::Genesis,
            Some(ts("2020-01-02T15:04:05Z")),
        )
    }

    #[test]
    fn it_should_read_full_block() {
        let _ = setup_tracing_test(module_path_for_test());
        let (mut sm, _) = new_sm();

        let metadata = transaction(
            10,
            TransactionType::BlockMetadata,
            Some(ts("2022-06-01T10:00:00Z")),
        );
        let user = transaction(11, TransactionType::User, None);
        let checkpoint = transaction(12, TransactionType::StateCheckpoint, None);

        let mut lines = vec![fire_init()];
        lines.extend(fire_block(
            3,
            &[metadata.clone(), user.clone(), checkpoint.clone()],
        ));

        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.height, 3);
        assert_eq!(block.chain_id, 4);
        assert_eq!(block.timestamp, Some(ts("2022-06-01T10:00:00Z")));
        assert_eq!(block.transactions, vec![metadata, user, checkpoint]);
        assert!(!sm.is_accumulating());
    }

    #[test]
    fn it_should_read_chain_id_from_six_params_init() {
        let (mut sm, _) = new_sm();
        let mut lines = vec![fire_init_custom("c 1 fork 0 0 7")];
        lines.extend(fire_block(1, &[genesis()]));

        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].height, 1);
        assert_eq!(blocks[0].chain_id, 7);
        assert_eq!(
            blocks[0].time().map(|t| t.to_rfc3339()),
            Some("2020-01-02T15:04:05+00:00".to_owned())
        );
        assert_eq!(blocks[0].transactions, vec![genesis()]);

        assert_eq!(
            sm.header(),
            Some(&StreamHeader {
                client_name: "c".to_owned(),
                client_version: "1".to_owned(),
                fork: "fork".to_owned(),
                major_version: 0,
                minor_version: 0,
                chain_id: 7,
            })
        );
    }

    #[test]
    fn it_should_read_named_chain_id_param() {
        let (mut sm, logger) = new_sm();
        sm.process_line("FIRE INIT aptos-node 1.2.3 aptos 0 5 chain_id 4")
            .unwrap();

        let header = sm.header().unwrap();
        assert_eq!(header.chain_id, 4);
        assert_eq!(header.minor_version, 5);

        let records = logger.records();
        assert_eq!(records[0].message, "initialized console reader correctly");
        assert_eq!(records[0].field("firehose_minor"), Some("5"));
        assert_eq!(records[0].field("chain_id"), Some("4"));
    }

    #[test]
    fn it_should_reject_init_errors() {
        let cases = [
            (
                "FIRE INIT a b c 0 0",
                "invalid INIT line: 6 or 7 fields required but found 5 (on line \"FIRE INIT a b c 0 0\")",
            ),
            (
                "FIRE INIT a b c 1 0 4",
                "only able to consume firehose format with major version 0, got 1 (on line \"FIRE INIT a b c 1 0 4\")",
            ),
            (
                "FIRE INIT a b c 0 0 network 4",
                "invalid INIT line: expected named \"chain_id\" param, got \"network\" (on line \"FIRE INIT a b c 0 0 network 4\")",
            ),
            (
                "FIRE INIT a b c 0 0 4294967296",
                "invalid INIT \"chain_id\" param \"4294967296\": number too large to fit in target type (on line \"FIRE INIT a b c 0 0 4294967296\")",
            ),
            (
                "FIRE INIT a b c x 0 4",
                "invalid INIT \"major_version\" param \"x\": invalid digit found in string (on line \"FIRE INIT a b c x 0 4\")",
            ),
        ];

        for (line, expected) in cases {
            let (mut sm, _) = new_sm();
            let err = sm.process_line(line).unwrap_err();
            assert_eq!(err.to_string(), expected, "line {line:?}");
            assert_eq!(err.line, line);
            assert_eq!(sm.state(), &ReaderState::AwaitingHeader);
        }
    }

    #[test]
    fn it_should_skip_lines_before_init() {
        let (mut sm, logger) = new_sm();
        let mut lines = vec![
            "some node output".to_owned(),
            fire_block_start(1),
            fire_trx(&genesis()),
            fire_block_end(1),
            fire_init(),
        ];
        lines.extend(fire_block(2, &[genesis()]));

        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].height, 2);

        let warnings: Vec<_> = logger
            .records()
            .into_iter()
            .filter(|record| record.level == Level::WARN)
            .collect();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].field("prefix"), Some("BLOCK_START"));
        assert_eq!(warnings[1].field("prefix"), Some("TRX"));
        assert_eq!(warnings[2].field("prefix"), Some("BLOCK_END"));
    }

    #[test]
    fn it_should_fail_on_malformed_line_even_before_init() {
        let (mut sm, _) = new_sm();
        let err = sm.process_line("FIRE INIT").unwrap_err();
        assert!(matches!(err.kind(), ProtocolError::MalformedLine));
        assert_eq!(
            err.to_string(),
            "invalid log line, expecting at least two tokens (on line \"FIRE INIT\")"
        );
    }

    #[test]
    fn it_should_reject_duplicate_init() {
        let (mut sm, _) = new_sm();
        sm.process_line(&fire_init()).unwrap();
        let err = sm.process_line(&fire_init()).unwrap_err();
        assert!(matches!(err.kind(), ProtocolError::DuplicateHeader));
        assert_eq!(sm.header().map(|h| h.chain_id), Some(4));
    }

    #[test]
    fn it_should_restart_block_on_second_block_start() {
        let (mut sm, logger) = new_sm();
        let user = transaction(3, TransactionType::User, None);
        let lines = vec![
            fire_init(),
            fire_block_start(1),
            fire_trx(&genesis()),
            fire_block_start(2),
            fire_trx(&genesis()),
            fire_trx(&user),
            fire_block_end(2),
        ];

        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].height, 2);
        assert_eq!(blocks[0].transactions, vec![genesis(), user]);

        let reset = logger
            .records()
            .into_iter()
            .find(|record| record.field("previous_active_block_height").is_some())
            .unwrap();
        assert_eq!(reset.level, Level::INFO);
        assert_eq!(reset.field("previous_active_block_height"), Some("1"));
        assert_eq!(reset.field("new_active_block_height"), Some("2"));
    }

    #[test]
    fn it_should_fail_on_block_end_height_mismatch() {
        let (mut sm, _) = new_sm();
        let lines = vec![
            fire_init_custom("c 1 fork 0 0 7"),
            fire_block_start(1),
            fire_trx(&genesis()),
            fire_block_end(2),
        ];

        let err = feed(&mut sm, &lines).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::HeightMismatch {
                active: 1,
                received: 2
            }
        ));
        assert_eq!(
            err.to_string(),
            "active block's height 1 does not match BLOCK_END received height 2 (on line \"FIRE BLOCK_END 2\")"
        );
        assert_eq!(sm.stats().totals().blocks, 0);
    }

    #[test]
    fn it_should_fail_on_empty_block() {
        let (mut sm, _) = new_sm();
        let lines = vec![fire_init(), fire_block_start(8), fire_block_end(8)];
        let err = feed(&mut sm, &lines).unwrap_err();
        assert_eq!(
            err.to_string(),
            "active block height 8 does not contain any transaction (on line \"FIRE BLOCK_END 8\")"
        );
    }

    #[test]
    fn it_should_enforce_transaction_ordering() {
        let (mut sm, _) = new_sm();
        let lines = vec![
            fire_init(),
            fire_block_start(1),
            "FIRE TRX EAEwAw==".to_owned(),
        ];
        let err = feed(&mut sm, &lines).unwrap_err();
        assert_eq!(
            err.to_string(),
            "received first TRX of type \"USER\" that is not a valid block start boundary transaction (only Block Metadata and Genesis transaction are) (on line \"FIRE TRX EAEwAw==\")"
        );

        let (mut sm, _) = new_sm();
        let lines = vec![
            fire_init(),
            fire_block_start(1),
            "FIRE TRX CgYI5Yy48AUQAg==".to_owned(),
            "FIRE TRX CgYI5Yy48AUQAw==".to_owned(),
        ];
        let err = feed(&mut sm, &lines).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::InvalidTransactionOrdering(OrderingViolation::BoundaryNotFirst(t))
                if *t == TransactionType::Genesis as i32
        ));
        assert_eq!(
            err.to_string(),
            "received non-first block start boundary TRX of type \"GENESIS\", expecting to only ever receive a single block start boundary transaction within an active block (on line \"FIRE TRX CgYI5Yy48AUQAw==\")"
        );
    }

    #[test]
    fn it_should_not_treat_unknown_types_as_boundaries() {
        let (mut sm, _) = new_sm();
        let metadata = transaction(1, TransactionType::BlockMetadata, None);
        let mut unknown = transaction(2, TransactionType::User, None);
        unknown.r#type = 4;
        let lines = vec![
            fire_init(),
            fire_block_start(1),
            fire_trx(&metadata),
            fire_trx(&unknown),
            fire_block_end(1),
        ];
        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].transactions[1].r#type, 4);

        let (mut sm, _) = new_sm();
        unknown.r#type = 7;
        let lines = vec![
            fire_init(),
            fire_block_start(2),
            fire_trx(&unknown),
        ];
        let err = feed(&mut sm, &lines).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::InvalidTransactionOrdering(OrderingViolation::FirstNotBoundary(7))
        ));
        assert!(
            err.to_string()
                .starts_with("received first TRX of type \"UNKNOWN(7)\" that is not a valid")
        );
    }

    #[test]
    fn it_should_reject_height_regression_after_resync() {
        let (mut sm, _) = new_sm();
        let mut lines = vec![fire_init()];
        lines.extend(fire_block(5, &[genesis()]));
        lines.extend(fire_block(5, &[genesis()]));
        lines.push(fire_block_start(3));
        lines.push(fire_trx(&genesis()));
        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(
            blocks.iter().map(|b| b.height).collect::<Vec<_>>(),
            vec![5, 5]
        );
        assert_eq!(sm.last_emitted_height(), Some(5));

        let err = sm.process_line(&fire_block_end(3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "received BLOCK_END for height 3 while block 5 was already emitted (on line \"FIRE BLOCK_END 3\")"
        );
        assert!(sm.is_accumulating());
        assert_eq!(sm.last_emitted_height(), Some(5));

        lines = vec![fire_block_start(6), fire_trx(&genesis()), fire_block_end(6)];
        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks[0].height, 6);
        assert_eq!(sm.last_emitted_height(), Some(6));
    }

    #[test]
    fn it_should_decode_node_encoded_transactions() {
        let (mut sm, _) = new_sm();
        let lines = vec![
            fire_init(),
            fire_block_start(1),
            "FIRE TRX CgYI5Yy48AUQAw==".to_owned(),
            "FIRE TRX EAEwAw==".to_owned(),
            fire_block_end(1),
        ];
        let blocks = feed(&mut sm, &lines).unwrap();
        let block = &blocks[0];
        assert_eq!(block.timestamp, Some(ts("2020-01-02T15:04:05Z")));
        assert_eq!(
            block.transactions,
            vec![
                transaction(
                    3,
                    TransactionType::Genesis,
                    Some(ts("2020-01-02T15:04:05Z"))
                ),
                transaction(1, TransactionType::User, None),
            ]
        );
    }

    #[test]
    fn it_should_require_active_block() {
        let (mut sm, _) = new_sm();
        sm.process_line(&fire_init()).unwrap();

        let err = sm.process_line(&fire_trx(&genesis())).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::NoActiveBlock { event: "TRX" }
        ));

        let err = sm.process_line(&fire_block_end(1)).unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::NoActiveBlock { event: "BLOCK_END" }
        ));
    }

    #[test]
    fn it_should_reject_invalid_payloads() {
        let (mut sm, _) = new_sm();
        sm.process_line(&fire_init()).unwrap();
        sm.process_line(&fire_block_start(5)).unwrap();

        let err = sm.process_line("FIRE TRX not*base64").unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::InvalidBase64 { height: 5, .. }
        ));
        assert!(err.to_string().starts_with("read trx in block 5: invalid base64 value: "));

        // 0x0A announces field 1 as length delimited but the length is missing
        let err = sm.process_line("FIRE TRX Cg==").unwrap_err();
        assert!(matches!(
            err.kind(),
            ProtocolError::InvalidPayload { height: 5, .. }
        ));

        let err = sm.process_line("FIRE TRX a b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid TRX line: 1 fields required but found 2 (on line \"FIRE TRX a b\")"
        );
    }

    #[test]
    fn it_should_reject_invalid_heights() {
        let (mut sm, _) = new_sm();
        sm.process_line(&fire_init()).unwrap();
        let err = sm.process_line("FIRE BLOCK_START -1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid BLOCK_START \"height\" param \"-1\": invalid digit found in string (on line \"FIRE BLOCK_START -1\")"
        );
    }

    #[test]
    fn it_should_ignore_unknown_tags_and_noise() {
        let (mut sm, logger) = new_sm();
        let mut lines = vec![
            fire_init(),
            "FIRE BLOCK_UNDO 1".to_owned(),
            "2022-06-01T10:00:00Z [aptos] INFO hello".to_owned(),
            fire_block_start(1),
            "FIRE SOMETHING_ELSE a b c".to_owned(),
            fire_trx(&genesis()),
        ];
        lines.push(fire_block_end(1));

        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            logger
                .messages()
                .iter()
                .filter(|message| *message == "skipping unknown firehose log line")
                .count(),
            2
        );
    }

    #[test]
    fn it_should_round_trip_encoded_transaction() {
        let (mut sm, _) = new_sm();
        let mut original = transaction(
            77,
            TransactionType::BlockMetadata,
            Some(ts("2023-03-04T05:06:07.123456789Z")),
        );
        original.epoch = 12;
        original.block_height = 9;
        original.info = Some(TransactionInfo {
            hash: vec![0xab; 32],
            success: true,
            vm_status: "Executed successfully".to_owned(),
            gas_used: 12,
            ..Default::default()
        });
        original.txn_data = Some(TxnData::BlockMetadata(vec![1, 2, 3]));

        let mut lines = vec![fire_init()];
        lines.extend(fire_block(9, &[original.clone()]));
        let blocks = feed(&mut sm, &lines).unwrap();
        assert_eq!(blocks[0].transactions, vec![original]);
    }

    #[test]
    fn it_should_decode_node_produced_state_checkpoint() {
        let (mut sm, _) = new_sm();
        let lines = vec![
            fire_init(),
            fire_block_start(10),
            fire_trx(&genesis()),
            "FIRE TRX CgoIqe2LlwYQj8cjEBMaoQEKILhgUcdnChYZzDe+VbmXy5kAJoiN7SEZrKDvIZs6OK1HEiA2G1IsMLUxQZBTzPRwScN5LxpQuOP7atP4VcK5KJkSwBogQUNDVU1VTEFUT1JfUExBQ0VIT0xERVJfSEFTSAAAAAAoATIVRXhlY3V0ZWQgc3VjY2Vzc2Z1bGx5OiBp+0BzUC0AF95n4YzdKFku3axn0P2COQP3UR1dTzJeeyACKAowAkoA".to_owned(),
            fire_block_end(10),
        ];
        let blocks = feed(&mut sm, &lines).unwrap();
        let checkpoint = &blocks[0].transactions[1];
        assert_eq!(checkpoint.version, 19);
        assert_eq!(checkpoint.r#type(), TransactionType::StateCheckpoint);
        assert_eq!(checkpoint.epoch, 2);
        assert_eq!(checkpoint.block_height, 10);
        assert_eq!(
            checkpoint.time().map(|t| t.to_rfc3339()),
            Some("2022-07-28T20:50:49.000582543+00:00".to_owned())
        );
        assert_eq!(checkpoint.txn_data, Some(TxnData::StateCheckpoint(Vec::new())));

        let info = checkpoint.info.as_ref().unwrap();
        assert!(info.success);
        assert_eq!(info.vm_status, "Executed successfully");
        assert_eq!(info.hash.len(), 32);
        assert!(info.event_root_hash.starts_with(b"ACCUMULATOR_PLACEHOLDER_HASH"));
    }

    #[test]
    fn it_should_emit_blocks_in_completion_order_with_gaps() {
        let (mut sm, _) = new_sm();
        let mut lines = vec![fire_init()];
        for height in [10, 11, 15] {
            lines.extend(fire_block(height, &[genesis()]));
        }
        let heights: Vec<_> = feed(&mut sm, &lines)
            .unwrap()
            .iter()
            .map(|block| block.height)
            .collect();
        assert_eq!(heights, vec![10, 11, 15]);
    }

    #[test]
    fn it_should_update_stats_on_block_completion() {
        let (mut sm, _) = new_sm();
        let start = Instant::now();
        sm.process_line(&fire_init()).unwrap();
        sm.process_line_with_clock(&fire_block_start(4), start).unwrap();
        sm.process_line(&fire_trx(&genesis())).unwrap();
        sm.process_line(&fire_trx(&transaction(2, TransactionType::User, None)))
            .unwrap();
        let block = sm
            .process_line_with_clock(&fire_block_end(4), start + Duration::from_millis(3))
            .unwrap();
        assert!(block.is_some());

        let totals = sm.stats().totals();
        assert_eq!(totals.blocks, 1);
        assert_eq!(totals.transactions, 2);
        assert_eq!(totals.parse_time, Duration::from_millis(3));
        assert_eq!(totals.last_block.map(|b| b.num), Some(4));
    }

    #[test]
    fn it_should_discard_pending_block() {
        let (mut sm, _) = new_sm();
        sm.process_line(&fire_init()).unwrap();
        sm.process_line(&fire_block_start(4)).unwrap();
        assert!(sm.is_accumulating());
        assert_eq!(sm.discard_pending(), Some(4));
        assert_eq!(sm.discard_pending(), None);
    }
}
