use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orange_money_apis::{RawResponse, Result, Transport};

/// Transport double that counts calls and answers with a fixed status.
pub struct RecordingTransport {
    calls: AtomicUsize,
    status: u16,
}

impl RecordingTransport {
    pub fn new(status: u16) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            status,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> RawResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RawResponse {
            status: self.status,
            body: b"service unavailable".to_vec(),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(
        &self,
        _url: &str,
        _body: Vec<u8>,
        _headers: &[(String, String)],
    ) -> Result<RawResponse> {
        Ok(self.answer())
    }

    async fn get(&self, _url: &str, _headers: &[(String, String)]) -> Result<RawResponse> {
        Ok(self.answer())
    }
}
