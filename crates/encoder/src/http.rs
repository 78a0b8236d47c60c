//! Blocking HTTP client for an embedding model sidecar.
//!
//! The sidecar runs next to this process (same filesystem), exposing
//! `POST /embed/image {"path": ...}` and `POST /embed/text {"text": ...}`,
//! both answering `{"embedding": [f32; dim]}`. Responses are re-normalized on
//! arrival so the unit-length invariant never depends on the remote side.

use std::path::Path;
use std::time::Duration;

use core_types::Embedding;
use serde::{Deserialize, Serialize};

use crate::{Encoder, EncoderError};

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client-side handle for the sidecar model.
pub struct HttpEncoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    dimension: usize,
    timeout: Duration,
}

impl HttpEncoder {
    pub fn new(
        endpoint: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EncoderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| EncoderError::Failed(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            dimension,
            timeout,
        })
    }

    fn post<B: Serialize>(&self, route: &str, body: &B) -> Result<Embedding, EncoderError> {
        let url = format!("{}/{route}", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| {
                if err.is_timeout() {
                    EncoderError::Timeout {
                        waited_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    EncoderError::Failed(err.to_string())
                }
            })?;
        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|err| EncoderError::InvalidResponse(err.to_string()))?;
        if parsed.embedding.len() != self.dimension {
            return Err(EncoderError::InvalidResponse(format!(
                "expected {} components, got {}",
                self.dimension,
                parsed.embedding.len()
            )));
        }
        Embedding::new(parsed.embedding)
            .and_then(Embedding::normalized)
            .map_err(|err| EncoderError::InvalidResponse(err.to_string()))
    }
}

impl Encoder for HttpEncoder {
    fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError> {
        let path = path.to_string_lossy();
        self.post("embed/image", &ImageRequest { path: &path })
    }

    fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError> {
        self.post("embed/text", &TextRequest { text })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned JSON response on a throwaway port.
    fn one_shot_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            // Drain headers, then the announced body.
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    return;
                }
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    break;
                }
                let lower = trimmed.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn parses_and_normalizes_sidecar_response() {
        let endpoint = one_shot_server(r#"{"embedding": [3.0, 4.0]}"#);
        let enc = HttpEncoder::new(endpoint, 2, Duration::from_secs(5)).unwrap();

        let e = enc.encode_text("concrete facade").unwrap();
        assert_eq!(e.dimension(), 2);
        assert!((e.as_slice()[0] - 0.6).abs() <= core_types::NORM_EPSILON);
        assert!((e.as_slice()[1] - 0.8).abs() <= core_types::NORM_EPSILON);
    }

    #[test]
    fn wrong_width_is_an_invalid_response() {
        let endpoint = one_shot_server(r#"{"embedding": [1.0, 0.0, 0.0]}"#);
        let enc = HttpEncoder::new(endpoint, 2, Duration::from_secs(5)).unwrap();

        let err = enc.encode_text("atrium").unwrap_err();
        assert!(matches!(err, EncoderError::InvalidResponse(_)));
    }
}
