use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum StubBehavior {
    /// Answers with upper-cased overview and one key learning per chapter.
    Enrich,
    /// Fails every call with HTTP 500.
    Fail,
    /// Fails calls whose input mentions the given chapter title.
    FailChapter(&'static str),
    /// Answers 200 with output text that is not JSON.
    Malformed,
}

pub struct OpenAiStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    pub fn spawn(behavior: StubBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start openai stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                if request.method() != &tiny_http::Method::Post || request.url() != "/v1/responses"
                {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }
                let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid json").with_status_code(400),
                    );
                    continue;
                };
                seen.lock().expect("lock requests").push(parsed.clone());

                let input = parsed
                    .get("input")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_owned();
                let fail = match behavior {
                    StubBehavior::Enrich | StubBehavior::Malformed => false,
                    StubBehavior::Fail => true,
                    StubBehavior::FailChapter(title) => input.contains(&format!("Chapter: {title}\n")),
                };
                if fail {
                    let error = serde_json::json!({ "error": { "message": "stub failure" } });
                    let _ = request.respond(
                        tiny_http::Response::from_string(error.to_string()).with_status_code(500),
                    );
                    continue;
                }

                let output_text = match behavior {
                    StubBehavior::Malformed => "Sure! Here is the JSON you asked for.".to_owned(),
                    _ => enrichment_for(&input).to_string(),
                };
                let response_body = serde_json::json!({
                    "id": "resp_stub",
                    "object": "response",
                    "output": [
                        {
                            "type": "message",
                            "role": "assistant",
                            "content": [
                                { "type": "output_text", "text": output_text }
                            ]
                        }
                    ]
                });

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(200)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("lock requests").clone()
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn enrichment_for(input: &str) -> Value {
    let body = input
        .split_once("--- Chapter Content ---\n")
        .map_or("", |(_, rest)| rest);
    serde_json::json!({
        "description": "Stub description.",
        "overview": [body.to_uppercase()],
        "instructions": [],
        "key_learnings": ["Stub takeaway."]
    })
}
