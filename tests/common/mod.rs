use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::Command;

/// Minimal HTTP/1.1 server answering GETs from a fixed route table.
/// Unknown paths get a 404.
pub struct StubServer {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(routes: &[(&str, u16, &str)]) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                handle(stream, &routes, &log);
            }
        });
        StubServer {
            base_url: format!("http://127.0.0.1:{}/api", port),
            hits,
        }
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

fn handle(stream: TcpStream, routes: &HashMap<String, (u16, String)>, hits: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => {}
        }
    }
    let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
    hits.lock().unwrap().push(path.clone());

    let (status, body) = routes
        .get(&path)
        .cloned()
        .unwrap_or((404, r#"{"error":"not found"}"#.to_string()));
    let response = format!(
        "HTTP/1.1 {} Stub\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// A base URL whose server accepts connections, reads the request and
/// never answers.
pub fn silent_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}/api", port)
}

/// A base URL on a port nothing listens on.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/api", port)
}

/// The binary with proxy and config variables cleared.
pub fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("category-smoke").unwrap();
    let proxies = [
        "HTTP_PROXY",
        "http_proxy",
        "HTTPS_PROXY",
        "https_proxy",
        "ALL_PROXY",
        "all_proxy",
    ];
    for var in proxies {
        cmd.env_remove(var);
    }
    cmd.env("NO_PROXY", "127.0.0.1,localhost")
        .env_remove("CATEGORY_API_URL")
        .env_remove("CATEGORY_API_TIMEOUT");
    cmd
}
