//! Walks handshake -> HELLO -> RUN/PULL -> GOODBYE against an in-process
//! mock transport standing in for a real Bolt server. Demonstrates the
//! crate's API surface without requiring a live Neo4j instance.

use std::collections::VecDeque;
use std::io::{Read, Write};

use boltstream::chunking;
use boltstream::connection::{Connection, Summary, Transport};
use boltstream::messages::{HelloParams, PullParams, RunParams};
use boltstream::packstream::PackStreamWriter;
use boltstream::value::{Structure, Value};
use boltstream::Version;
use indexmap::IndexMap;

/// A transport that has a scripted set of server replies queued up and
/// collects whatever the client writes to it.
struct ScriptedTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbound.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn close(&mut self) -> boltstream::Result<()> {
        Ok(())
    }
}

fn message(tag: u8, fields: Vec<Value>) -> Vec<u8> {
    let mut w = PackStreamWriter::new(Vec::new());
    w.write_value(&Value::Structure(Structure::new(tag, fields))).unwrap();
    let mut chunked = Vec::new();
    chunking::chunk_write(&mut chunked, &w.into_inner()).unwrap();
    chunked
}

fn main() {
    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let mut scripted = Vec::new();
    scripted.extend([0x00, 0x00, 0x00, 0x05]); // server picks Bolt 5.0

    let mut hello_meta = IndexMap::new();
    hello_meta.insert("connection_id".to_string(), Value::String("bolt-1".to_string()));
    hello_meta.insert("server".to_string(), Value::String("Neo4j/5.0.0".to_string()));
    scripted.extend(message(0x70, vec![Value::Map(hello_meta)])); // SUCCESS

    let mut run_meta = IndexMap::new();
    run_meta.insert("fields".to_string(), Value::List(vec![Value::String("n".to_string())]));
    scripted.extend(message(0x70, vec![Value::Map(run_meta)])); // RUN's SUCCESS

    scripted.extend(message(0x71, vec![Value::List(vec![Value::Integer(1)])])); // RECORD
    let mut pull_meta = IndexMap::new();
    pull_meta.insert("has_more".to_string(), Value::Boolean(false));
    scripted.extend(message(0x70, vec![Value::Map(pull_meta)])); // PULL's SUCCESS

    let transport = ScriptedTransport { inbound: scripted.into(), outbound: Vec::new() };
    let mut conn = Connection::new(transport);

    let version = conn
        .perform_handshake(&[Version::new(5, 4), Version::new(5, 0), Version::new(4, 4)])
        .expect("handshake");
    println!("negotiated Bolt {version}");

    let hello = HelloParams { user_agent: "boltstream-demo/0.1".to_string(), ..Default::default() };
    match conn.send_hello(&hello).expect("hello") {
        Summary::Success(s) => println!("HELLO ok: {:?}", s.metadata.get("connection_id")),
        Summary::Failure(f) => panic!("HELLO failed: {}", f.code),
    }

    let run = RunParams { query: "RETURN 1 AS n".to_string(), ..Default::default() };
    let mut records = Vec::new();
    conn.run(&run, |_| Ok(())).expect("run");
    conn.pull(&PullParams { n: -1, qid: None }, |record| {
        records.push(record.fields);
        Ok(())
    })
    .expect("pull");

    println!("records: {records:?}");
    println!("final state: {:?}", conn.state());
}
