//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chainlcd_core::{EndpointConfig, RequestOptions, RestResponse, RestTransport, TransportError};

/// How a scripted host answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(&'static str),
    Status(u16),
    Refused,
    Hang,
}

/// Answers per base address; unscripted hosts reply `{}`.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, address: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(address.to_string(), reply);
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Base addresses of the requests whose URL ends with `path`.
    pub fn hosts_for(&self, path: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|url| url.strip_suffix(path).map(str::to_string))
            .collect()
    }

    fn reply_for(&self, url: &str) -> Reply {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .find(|(address, _)| url.starts_with(address.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Json("{}"))
    }
}

#[async_trait]
impl RestTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        _options: &RequestOptions,
    ) -> Result<RestResponse, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.reply_for(url) {
            Reply::Json(body) => Ok(RestResponse::new(200, body)),
            Reply::Status(status) => Ok(RestResponse::new(status, "")),
            Reply::Refused => Err(TransportError::Http("connection refused".into())),
            Reply::Hang => futures::future::pending().await,
        }
    }
}

pub fn endpoints(addrs: &[&str]) -> Vec<EndpointConfig> {
    addrs
        .iter()
        .enumerate()
        .map(|(i, a)| EndpointConfig::new(*a, format!("provider-{i}")).unwrap())
        .collect()
}

pub const A: &str = "https://a.example.com";
pub const B: &str = "https://b.example.com";
pub const C: &str = "https://c.example.com";
