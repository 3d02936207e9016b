//! In-memory transport used by the crawler unit tests

use crate::crawler::transport::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Canned reply for one URL
#[derive(Clone)]
pub enum Reply {
    Page {
        status: u16,
        content_type: &'static str,
        body: &'static str,
    },
    Redirect(String),
    Fail,
}

impl Reply {
    pub fn html(body: &'static str) -> Self {
        Self::Page {
            status: 200,
            content_type: "text/html",
            body,
        }
    }
}

/// Transport answering from a URL -> reply table and recording every call
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, HeaderMap, Instant)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _, _)| url.clone())
            .collect()
    }

    pub fn headers(&self, index: usize) -> HeaderMap {
        self.calls.lock().unwrap()[index].1.clone()
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, _, t)| *t).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(
        &self,
        url: &str,
        headers: &HeaderMap,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone(), Instant::now()));

        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Page {
                status,
                content_type,
                body,
            }) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                Ok(TransportResponse {
                    status,
                    headers,
                    location: None,
                    body: Bytes::from_static(body.as_bytes()),
                })
            }
            Some(Reply::Redirect(location)) => Ok(TransportResponse {
                status: 302,
                headers: HeaderMap::new(),
                location: Some(location),
                body: Bytes::new(),
            }),
            Some(Reply::Fail) => Err(TransportError::Connect("connection refused".to_string())),
            None => Ok(TransportResponse {
                status: 404,
                headers: HeaderMap::new(),
                location: None,
                body: Bytes::new(),
            }),
        }
    }
}
