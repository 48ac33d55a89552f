//! Fakes and fixtures shared by the scenario tests.

use crate::chunker::Chunker;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use crate::extract::audio::test_support::FixedTranscriber;
use crate::extract::image::test_support::FixedCaptioner;
use crate::extract::{Capabilities, Extractors, OcrEngine};
use crate::retriever::Retriever;
use async_trait::async_trait;
use docent_core::AppResult;
use docent_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const DIMENSIONS: usize = 384;

/// OCR engine that "recognizes" preset text for specific pages.
pub struct ScriptedOcr {
    pub pages: HashMap<u32, String>,
    pub calls: Mutex<Vec<u32>>,
}

impl ScriptedOcr {
    pub fn new(pages: &[(u32, &str)]) -> Self {
        Self {
            pages: pages.iter().map(|(p, t)| (*p, t.to_string())).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize_page(&self, _pdf_path: &Path, page: u32) -> AppResult<String> {
        self.calls.lock().unwrap().push(page);
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

/// LLM client that records the request and replies with a fixed answer.
pub struct ScriptedLlm {
    pub answer: String,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LlmResponse {
            content: self.answer.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

pub fn provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(TrigramProvider::new(DIMENSIONS))
}

pub fn capabilities(ocr: Option<Arc<dyn OcrEngine>>) -> Capabilities {
    Capabilities {
        ocr,
        captioner: Arc::new(FixedCaptioner {
            caption: "a lighthouse on a rocky coast at sunset".to_string(),
        }),
        transcriber: Some(Arc::new(FixedTranscriber {
            transcript: "The quarterly meeting is moved to Thursday.".to_string(),
        })),
    }
}

pub fn retriever(dir: &TempDir, ocr: Option<Arc<dyn OcrEngine>>) -> Retriever {
    Retriever::new(
        index_dir(dir),
        provider(),
        Extractors::new(Chunker::default(), 50, capabilities(ocr)),
    )
}

pub fn index_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("index")
}

pub fn write(dir: &TempDir, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
