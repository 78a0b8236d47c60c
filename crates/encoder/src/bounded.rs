//! Wall-clock bound for encoder calls.
//!
//! The inner call runs on a worker thread; if the deadline passes first the
//! caller gets [`EncoderError::Timeout`] and the worker is left to finish on
//! its own, its result discarded when the channel closes.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use core_types::Embedding;
use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::{Encoder, EncoderError};

/// Wraps any encoder so no call can block its caller past `timeout`.
pub struct BoundedEncoder {
    inner: Arc<dyn Encoder>,
    timeout: Duration,
}

impl BoundedEncoder {
    pub fn new(inner: Arc<dyn Encoder>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn run<F>(&self, call: F) -> Result<Embedding, EncoderError>
    where
        F: FnOnce(&dyn Encoder) -> Result<Embedding, EncoderError> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            // The receiver may be gone after a timeout; nothing to do then.
            let _ = tx.send(call(inner.as_ref()));
        });
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "encoder call exceeded deadline; abandoning worker");
                Err(EncoderError::Timeout {
                    waited_ms: self.timeout.as_millis() as u64,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(EncoderError::Failed(
                "encoder worker exited without a result".to_string(),
            )),
        }
    }
}

impl Encoder for BoundedEncoder {
    fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError> {
        let path = path.to_path_buf();
        self.run(move |enc| enc.encode_image(&path))
    }

    fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError> {
        let text = text.to_owned();
        self.run(move |enc| enc.encode_text(&text))
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashEncoder;

    /// Encoder that stalls before answering.
    struct SlowEncoder {
        delay: Duration,
        inner: HashEncoder,
    }

    impl Encoder for SlowEncoder {
        fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError> {
            thread::sleep(self.delay);
            self.inner.encode_image(path)
        }

        fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError> {
            thread::sleep(self.delay);
            self.inner.encode_text(text)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    #[test]
    fn fast_calls_pass_through() {
        let enc = BoundedEncoder::new(Arc::new(HashEncoder::new(8)), Duration::from_secs(5));
        let direct = HashEncoder::new(8).encode_text("atrium").unwrap();
        assert_eq!(enc.encode_text("atrium").unwrap(), direct);
        assert_eq!(enc.dimension(), 8);
    }

    #[test]
    fn slow_calls_time_out() {
        let slow = SlowEncoder {
            delay: Duration::from_secs(10),
            inner: HashEncoder::new(8),
        };
        let enc = BoundedEncoder::new(Arc::new(slow), Duration::from_millis(50));
        let err = enc.encode_text("atrium").unwrap_err();
        assert!(matches!(err, EncoderError::Timeout { .. }));
    }
}
