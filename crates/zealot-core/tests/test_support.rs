//! Shared test support utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use zealot_core::http::{ApiRequest, RawResponse};
use zealot_core::{Device, FileProbe, Transport, TransportFailure};

/// Transport stub that replays scripted results and records every request
#[derive(Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn fail(self, failure: TransportFailure) -> Self {
        self.script.lock().unwrap().push_back(Err(failure));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(200, "{}")))
    }
}

/// Treats every path as readable
pub struct AnyFile;

impl FileProbe for AnyFile {
    fn is_readable(&self, _path: &Path) -> bool {
        true
    }
}

pub fn device(udid: &str, name: &str, model: &str) -> Device {
    Device {
        udid: udid.to_string(),
        name: name.to_string(),
        model: model.to_string(),
    }
}
