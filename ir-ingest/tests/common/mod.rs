#![allow(dead_code)]

//! Minimal HTTP/1.1 server recording every request it receives.

use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct StubServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    /// Start a server answering every request with `status` and `{}`.
    pub fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let sink = sink.clone();
                thread::spawn(move || serve(stream, status, sink));
            }
        });
        StubServer { port, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn serve(stream: TcpStream, status: u16, sink: Arc<Mutex<Vec<RecordedRequest>>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut writer = stream;
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
            return;
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            return;
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query(query)),
            None => (target.clone(), Vec::new()),
        };
        sink.lock().unwrap().push(RecordedRequest {
            method,
            path,
            query,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });

        let response =
            format!("HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: 2\r\n\r\n{{}}");
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    let url = reqwest::Url::parse(&format!("http://stub/?{query}")).expect("valid query string");
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Write a small dataset `toy` under `root`: three documents (one with a NUL
/// in its text), two queries and three qrels.
pub fn write_toy_dataset(root: &Path) {
    let dir = root.join("toy");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("docs.jsonl"),
        concat!(
            r#"{"doc_id": "d1", "title": "First", "text": "one"}"#,
            "\n",
            r#"{"doc_id": "d2", "text": "t\u0000wo"}"#,
            "\n",
            r#"{"doc_id": "d3", "title": null, "text": "three"}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("queries.jsonl"),
        concat!(
            r#"{"query_id": "q1", "text": "first query", "description": "about one"}"#,
            "\n",
            r#"{"query_id": "q2", "text": "second query"}"#,
            "\n",
        ),
    )
    .unwrap();
    fs::write(dir.join("qrels.trec"), "q1 0 d1 1\nq1 0 d2 0\nq2 0 d3 2\n").unwrap();
}
