//! The physical connection state machine: sequences handshake,
//! authentication, request/response, reset and goodbye over a transport,
//! classifies server FAILUREs, and marks connections defunct. Synchronous
//! and single-owner: one request's full response is observed before the
//! next is sent, with no reentrancy within a request.

use std::io::{Read, Write};

use log::{debug, error, warn};

use crate::chunking::{self, DEFAULT_MAX_MESSAGE_SIZE};
use crate::errors::{classify_server_code, BoltError, Result, Severity};
use crate::handshake;
use crate::messages::client::{
    serialize_begin, serialize_commit, serialize_discard, serialize_goodbye, serialize_hello,
    serialize_logoff, serialize_logon, serialize_pull, serialize_reset, serialize_rollback,
    serialize_route, serialize_run, serialize_telemetry, BeginParams, DiscardParams, HelloParams,
    LogonParams, PullParams, RouteParams, RunParams, TelemetryParams,
};
use crate::messages::server::{
    deserialize_failure, deserialize_ignored, deserialize_record, deserialize_success,
    decode_message_envelope, FailureMessageParams, RecordMessageParams, SuccessMessageParams,
};
use crate::messages::tags::MessageTag;
use crate::packstream::PackStreamWriter;
use crate::version::Version;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Fresh,
    TcpConnected,
    BoltHandshaken,
    HelloAuthSent,
    Ready,
    Streaming,
    AwaitingSummary,
    FailedServerReported,
    Defunct,
    Closed,
}

/// A request's terminal outcome: exactly one of these closes out a
/// request, optionally preceded by RECORDs for streaming requests.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Success(SuccessMessageParams),
    Failure(FailureMessageParams),
}

/// A byte-oriented transport the connection drives synchronously. Anything
/// implementing blocking `Read`/`Write` qualifies; `close` is separated out
/// because `std::io` has no portable blocking-close abstraction.
pub trait Transport: Read + Write {
    fn close(&mut self) -> Result<()>;
}

pub struct Connection<T: Transport> {
    transport: T,
    state: State,
    version: Option<Version>,
    max_message_size: Option<u64>,
    last_failure_severity: Option<Severity>,
}

impl<T: Transport> Connection<T> {
    /// Wraps an already-open transport. `FRESH`/`TCP_CONNECTED` describe
    /// connection setup the caller already performed by handing us a live
    /// transport; both collapse into the initial state here, which
    /// [`perform_handshake`](Self::perform_handshake) requires.
    pub fn new(transport: T) -> Self {
        Connection {
            transport,
            state: State::TcpConnected,
            version: None,
            max_message_size: Some(DEFAULT_MAX_MESSAGE_SIZE),
            last_failure_severity: None,
        }
    }

    /// Disables the total-message-size cap: only for trusted servers.
    pub fn without_message_size_cap(mut self) -> Self {
        self.max_message_size = None;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn last_failure_severity(&self) -> Option<Severity> {
        self.last_failure_severity
    }

    pub fn mark_defunct(&mut self) {
        if self.state != State::Defunct {
            error!("connection marked DEFUNCT");
        }
        self.state = State::Defunct;
    }

    pub fn perform_handshake(&mut self, proposed: &[Version]) -> Result<Version> {
        if self.state != State::TcpConnected {
            return Err(BoltError::InvalidArgument(format!(
                "cannot handshake from state {:?}",
                self.state
            )));
        }
        match handshake::perform_handshake(&mut self.transport, proposed) {
            Ok(v) => {
                debug!("negotiated Bolt version {v}");
                self.version = Some(v);
                self.state = State::BoltHandshaken;
                Ok(v)
            }
            Err(e) => {
                self.mark_defunct();
                Err(e)
            }
        }
    }

    fn version_or_defunct(&mut self) -> Result<Version> {
        self.version.ok_or_else(|| {
            BoltError::InvalidArgument("no version negotiated yet".to_string())
        })
    }

    fn chunk_send(&mut self, payload: &[u8]) -> Result<()> {
        match chunking::chunk_write(&mut self.transport, payload) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_defunct();
                Err(e)
            }
        }
    }

    /// Core receive loop shared by [`send_request_receive_summary`] and
    /// [`send_request_receive_stream`]: skips NOOP chunks, dispatches
    /// RECORD to `on_record` (when given), and returns on the terminal
    /// SUCCESS/FAILURE/IGNORED.
    fn receive_until_summary(
        &mut self,
        mut on_record: Option<&mut dyn FnMut(RecordMessageParams) -> Result<()>>,
    ) -> Result<Summary> {
        loop {
            let payload = match chunking::chunk_read(&mut self.transport, self.max_message_size) {
                Ok(p) => p,
                Err(e) => {
                    self.mark_defunct();
                    return Err(e);
                }
            };
            if payload.is_empty() {
                warn!("skipping NOOP chunk while awaiting summary");
                continue;
            }
            let (tag, structure) = match decode_message_envelope(&payload) {
                Ok(v) => v,
                Err(e) => {
                    self.mark_defunct();
                    return Err(e);
                }
            };
            match tag {
                MessageTag::Success => {
                    let s = deserialize_success(&structure).map_err(|e| {
                        self.mark_defunct();
                        e
                    })?;
                    self.state = State::Ready;
                    self.last_failure_severity = None;
                    return Ok(Summary::Success(s));
                }
                MessageTag::Failure => {
                    let f = deserialize_failure(&structure).map_err(|e| {
                        self.mark_defunct();
                        e
                    })?;
                    self.last_failure_severity = Some(classify_server_code(&f.code));
                    self.state = State::FailedServerReported;
                    warn!("server FAILURE: {} ({})", f.code, f.message);
                    return Ok(Summary::Failure(f));
                }
                MessageTag::Ignored => {
                    let ignored = deserialize_ignored(&structure).map_err(|e| {
                        self.mark_defunct();
                        e
                    })?;
                    let code = ignored.code_or_default();
                    self.last_failure_severity = Some(classify_server_code(&code));
                    self.state = State::FailedServerReported;
                    warn!("server IGNORED request ({code})");
                    return Ok(Summary::Failure(FailureMessageParams {
                        code,
                        message: "request ignored by server".to_string(),
                        metadata: ignored.metadata,
                    }));
                }
                MessageTag::Record => {
                    let record = deserialize_record(&structure).map_err(|e| {
                        self.mark_defunct();
                        e
                    })?;
                    match &mut on_record {
                        Some(handler) => {
                            if let Err(e) = handler(record) {
                                self.mark_defunct();
                                return Err(e);
                            }
                        }
                        None => {
                            self.mark_defunct();
                            return Err(BoltError::InvalidMessageFormat(
                                "received RECORD outside a streaming request".to_string(),
                            ));
                        }
                    }
                }
                other => {
                    self.mark_defunct();
                    return Err(BoltError::InvalidMessageFormat(format!(
                        "unexpected message tag {other:?} while awaiting summary"
                    )));
                }
            }
        }
    }

    /// Sends an already-encoded request payload and waits for the terminal
    /// SUCCESS/FAILURE. Valid from READY, HELLO_AUTH_SENT or
    /// BOLT_HANDSHAKEN.
    pub fn send_request_receive_summary(&mut self, payload: &[u8]) -> Result<Summary> {
        match self.state {
            State::Ready | State::HelloAuthSent | State::BoltHandshaken => {}
            other => {
                return Err(BoltError::InvalidArgument(format!(
                    "cannot send a request from state {other:?}"
                )))
            }
        }
        self.chunk_send(payload)?;
        self.state = State::AwaitingSummary;
        self.receive_until_summary(None)
    }

    /// Identical to [`send_request_receive_summary`] but RECORDs before the
    /// terminal summary are delivered to `record_handler`. Transitions to
    /// STREAMING after sending.
    pub fn send_request_receive_stream(
        &mut self,
        payload: &[u8],
        mut record_handler: impl FnMut(RecordMessageParams) -> Result<()>,
    ) -> Result<Summary> {
        if self.state != State::Ready {
            return Err(BoltError::InvalidArgument(format!(
                "cannot stream a request from state {:?}",
                self.state
            )));
        }
        self.chunk_send(payload)?;
        self.state = State::Streaming;
        self.receive_until_summary(Some(&mut record_handler))
    }

    pub fn send_hello(&mut self, params: &HelloParams) -> Result<Summary> {
        if self.state != State::BoltHandshaken {
            return Err(BoltError::InvalidArgument(format!(
                "cannot send HELLO from state {:?}",
                self.state
            )));
        }
        let version = self.version_or_defunct()?;
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_hello(params, &mut w, version)?;
        self.state = State::HelloAuthSent;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn send_logon(&mut self, params: &LogonParams) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_logon(params, &mut w)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn send_logoff(&mut self) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_logoff(&mut w)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn run(
        &mut self,
        params: &RunParams,
        record_handler: impl FnMut(RecordMessageParams) -> Result<()>,
    ) -> Result<Summary> {
        let version = self.version_or_defunct()?;
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_run(params, &mut w, version)?;
        self.send_request_receive_stream(&w.into_inner(), record_handler)
    }

    pub fn pull(
        &mut self,
        params: &PullParams,
        record_handler: impl FnMut(RecordMessageParams) -> Result<()>,
    ) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_pull(params, &mut w)?;
        self.send_request_receive_stream(&w.into_inner(), record_handler)
    }

    pub fn discard(
        &mut self,
        params: &DiscardParams,
        record_handler: impl FnMut(RecordMessageParams) -> Result<()>,
    ) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_discard(params, &mut w)?;
        self.send_request_receive_stream(&w.into_inner(), record_handler)
    }

    pub fn begin(&mut self, params: &BeginParams) -> Result<Summary> {
        let version = self.version_or_defunct()?;
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_begin(params, &mut w, version)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn commit(&mut self) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_commit(&mut w)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn rollback(&mut self) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_rollback(&mut w)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn route(&mut self, params: &RouteParams) -> Result<Summary> {
        let version = self.version_or_defunct()?;
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_route(params, &mut w, version)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    pub fn telemetry(&mut self, params: &TelemetryParams) -> Result<Summary> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_telemetry(params, &mut w)?;
        self.send_request_receive_summary(&w.into_inner())
    }

    /// Builds and sends RESET; on success forces the state back to READY
    /// even from FAILED_SERVER_REPORTED. Any failure leaves the connection
    /// DEFUNCT — RESET itself failing is not recoverable.
    pub fn perform_reset(&mut self) -> Result<()> {
        let prior = self.state;
        if prior != State::FailedServerReported && prior != State::Ready {
            return Err(BoltError::InvalidArgument(format!(
                "cannot RESET from state {prior:?}"
            )));
        }
        // send_request_receive_summary only accepts READY/HELLO_AUTH_SENT/
        // BOLT_HANDSHAKEN; a FAILED_SERVER_REPORTED connection is nudged
        // back to READY first so the primitive's state guard accepts it.
        self.state = State::Ready;
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_reset(&mut w)?;
        match self.send_request_receive_summary(&w.into_inner()) {
            Ok(Summary::Success(_)) => {
                self.state = State::Ready;
                self.last_failure_severity = None;
                Ok(())
            }
            Ok(Summary::Failure(f)) => {
                self.mark_defunct();
                Err(BoltError::UnknownError(format!("RESET itself failed: {}", f.code)))
            }
            Err(e) => {
                self.mark_defunct();
                Err(e)
            }
        }
    }

    /// Serializes and sends GOODBYE without waiting for a reply, then
    /// closes the transport.
    pub fn send_goodbye(&mut self) -> Result<()> {
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_goodbye(&mut w)?;
        let payload = w.into_inner();
        let send_result = self.chunk_send(&payload);
        let close_result = self.transport.close();
        self.state = State::Closed;
        send_result?;
        close_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct MockTransport {
        incoming: Cursor<Vec<u8>>,
        outgoing: Vec<u8>,
        closed: bool,
    }

    impl MockTransport {
        fn new(incoming: Vec<u8>) -> Self {
            MockTransport { incoming: Cursor::new(incoming), outgoing: Vec::new(), closed: false }
        }
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.incoming.read(buf)
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outgoing.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Transport for MockTransport {
        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn message_bytes(tag: u8, fields: Vec<crate::value::Value>) -> Vec<u8> {
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&crate::value::Value::Structure(crate::value::Structure::new(tag, fields)))
            .unwrap();
        let body = w.into_inner();
        let mut chunked = Vec::new();
        chunking::chunk_write(&mut chunked, &body).unwrap();
        chunked
    }

    #[test]
    fn handshake_hello_success_scenario() {
        use indexmap::IndexMap;
        use crate::value::Value;

        let mut incoming = vec![0x00, 0x00, 0x00, 0x05]; // negotiated 5.0
        let mut success_meta = IndexMap::new();
        success_meta.insert("connection_id".to_string(), Value::String("c-1".to_string()));
        success_meta.insert("server".to_string(), Value::String("srv/5".to_string()));
        incoming.extend(message_bytes(MessageTag::Success.byte(), vec![Value::Map(success_meta)]));

        let mut conn = Connection::new(MockTransport::new(incoming));
        let version = conn
            .perform_handshake(&[Version::new(5, 4), Version::new(5, 0), Version::new(4, 4)])
            .unwrap();
        assert_eq!(version, Version::new(5, 0));
        assert_eq!(conn.state(), State::BoltHandshaken);

        let hello = HelloParams {
            user_agent: "lib/0.1".to_string(),
            ..Default::default()
        };
        let summary = conn.send_hello(&hello).unwrap();
        match summary {
            Summary::Success(s) => assert_eq!(s.metadata.get("connection_id").unwrap().as_str(), Some("c-1")),
            Summary::Failure(_) => panic!("expected SUCCESS"),
        }
        assert_eq!(conn.state(), State::Ready);
    }

    #[test]
    fn failure_then_reset_recovers_to_ready() {
        use indexmap::IndexMap;
        use crate::value::Value;

        let mut meta = IndexMap::new();
        meta.insert("code".to_string(), Value::String("Neo.ClientError.Statement.SyntaxError".to_string()));
        meta.insert("message".to_string(), Value::String("boom".to_string()));
        let mut incoming = message_bytes(MessageTag::Failure.byte(), vec![Value::Map(meta)]);
        incoming.extend(message_bytes(MessageTag::Success.byte(), vec![Value::Map(IndexMap::new())]));

        let mut conn = Connection::new(MockTransport::new(incoming));
        conn.version = Some(Version::new(5, 0));
        conn.state = State::Ready;

        let run = RunParams { query: "BOOM".to_string(), ..Default::default() };
        let summary = conn.run(&run, |_| Ok(())).unwrap();
        assert!(matches!(summary, Summary::Failure(_)));
        assert_eq!(conn.state(), State::FailedServerReported);
        assert_eq!(conn.last_failure_severity(), Some(Severity::Recoverable));

        conn.perform_reset().unwrap();
        assert_eq!(conn.state(), State::Ready);
    }

    #[test]
    fn noop_chunk_is_skipped_during_streaming() {
        use indexmap::IndexMap;
        use crate::value::Value;

        let mut incoming = message_bytes(MessageTag::Record.byte(), vec![Value::List(vec![Value::Integer(1)])]);
        incoming.extend_from_slice(&[0x00, 0x00]); // bare NOOP between records
        incoming.extend(message_bytes(MessageTag::Record.byte(), vec![Value::List(vec![Value::Integer(2)])]));
        incoming.extend(message_bytes(MessageTag::Success.byte(), vec![Value::Map(IndexMap::new())]));

        let mut conn = Connection::new(MockTransport::new(incoming));
        conn.version = Some(Version::new(5, 0));
        conn.state = State::Ready;

        let mut seen = Vec::new();
        let pull = PullParams { n: -1, qid: None };
        let summary = conn.pull(&pull, |r| {
            seen.push(r.fields);
            Ok(())
        }).unwrap();

        assert!(matches!(summary, Summary::Success(_)));
        assert_eq!(seen.len(), 2);
        assert_eq!(conn.state(), State::Ready);
    }

    #[test]
    fn goodbye_closes_transport() {
        let mut conn = Connection::new(MockTransport::new(Vec::new()));
        conn.version = Some(Version::new(5, 0));
        conn.state = State::Ready;
        conn.send_goodbye().unwrap();
        assert_eq!(conn.state(), State::Closed);
        assert!(conn.transport.closed);
    }
}
