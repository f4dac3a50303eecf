//! In-memory doubles for the network and the source decoder.

use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    download::Transport,
    errors::{DecodeError, FetchError},
    reading::{RawVariable, SourceDecoder, SourceFile},
};

#[derive(Debug, Clone)]
pub enum FakeResponse {
    Body(Vec<u8>),
    NotFound,
    ServerError(u16),
    /// Writes part of a body, then fails.
    Truncated,
}

/// Answers by URL prefix, anything unmatched gets a small body.
#[derive(Default)]
pub struct FakeTransport {
    responses: Vec<(String, FakeResponse)>,
    requests: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn with_response(mut self, prefix: &str, response: FakeResponse) -> Self {
        self.responses.push((prefix.to_string(), response));
        self
    }

    /// Holds every request open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Most requests that were open at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, out: &mut File) -> Result<u64, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(open, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let response = self
            .responses
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| FakeResponse::Body(b"CDF".to_vec()));

        match response {
            FakeResponse::Body(body) => {
                out.write_all(&body)?;
                Ok(body.len() as u64)
            }
            FakeResponse::NotFound => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            FakeResponse::ServerError(status) => Err(FetchError::ServerError {
                url: url.to_string(),
                status,
            }),
            FakeResponse::Truncated => {
                out.write_all(b"CD")?;
                Err(FetchError::Transport {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                })
            }
        }
    }
}

/// Serves variables by file name, `None` marks a non-float variable.
#[derive(Default, Clone)]
pub struct MemoryDecoder {
    files: HashMap<String, HashMap<String, Option<RawVariable>>>,
}

impl MemoryDecoder {
    pub fn with_variable(mut self, file: &str, name: &str, data: Vec<f32>, shape: Vec<usize>) -> Self {
        self.files
            .entry(file.to_string())
            .or_default()
            .insert(name.to_string(), Some(RawVariable { data, shape }));
        self
    }

    pub fn with_integer_variable(mut self, file: &str, name: &str) -> Self {
        self.files
            .entry(file.to_string())
            .or_default()
            .insert(name.to_string(), None);
        self
    }
}

struct MemoryFile {
    variables: HashMap<String, Option<RawVariable>>,
}

impl SourceDecoder for MemoryDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn SourceFile>, DecodeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let variables = self.files.get(&name).cloned().ok_or_else(|| DecodeError::Open {
            path: path.to_path_buf(),
            message: "no such file".to_string(),
        })?;

        Ok(Box::new(MemoryFile { variables }))
    }
}

impl SourceFile for MemoryFile {
    fn variables(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    fn read_variable(&self, name: &str) -> Result<RawVariable, DecodeError> {
        match self.variables.get(name) {
            Some(Some(variable)) => Ok(variable.clone()),
            Some(None) => Err(DecodeError::WrongType {
                name: name.to_string(),
                path: name.into(),
            }),
            None => Err(DecodeError::MissingVariable {
                name: name.to_string(),
                path: name.into(),
            }),
        }
    }
}
