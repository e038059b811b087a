//! Test doubles for driving the engine without a live transport.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::message::PushMessage;
use crate::transport::{PushTransport, TransportError};

/// A scripted in-memory transport.
///
/// Delivers every message with ids `m1`, `m2`, ... unless the target token
/// has been scripted to fail via [`StubTransport::fail_token`]. Records every
/// accepted message for assertions.
#[derive(Debug, Default)]
pub struct StubTransport {
    failures: Mutex<HashMap<String, TransportError>>,
    sent: Mutex<Vec<PushMessage>>,
    counter: AtomicU64,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts every send to `token` to fail with `error`.
    pub fn fail_token(&self, token: &str, error: TransportError) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(token.to_string(), error);
    }

    /// Messages handed to the transport, including failed ones.
    pub fn sent_messages(&self) -> Vec<PushMessage> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }
}

#[async_trait]
impl PushTransport for StubTransport {
    async fn send(&self, message: &PushMessage) -> Result<String, TransportError> {
        self.sent
            .lock()
            .expect("sent lock")
            .push(message.clone());

        if let Some(err) = self
            .failures
            .lock()
            .expect("failures lock")
            .get(&message.token)
        {
            return Err(err.clone());
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("m{n}"))
    }
}
