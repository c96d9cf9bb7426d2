//! In-memory collaborators shared by the core test modules.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use strata_types::error::ServiceError;
use strata_types::job::{JobRequest, JobStatusReport, ModalityConfig, RESULT_MANIFEST};
use strata_types::llm::{GenerationRequest, GenerationResponse, LlmError};
use strata_types::media::{BlobInfo, ObjectLocation, SourceObject};
use strata_types::vector::{DistanceMetric, IndexMatch, StoredVector};

use crate::embedding::service::EmbeddingService;
use crate::ingest::machine::Scheduler;
use crate::llm::provider::GenerationProvider;
use crate::storage::blob_store::BlobStore;
use crate::storage::extractor::DocumentExtractor;
use crate::vector::index::VectorIndex;

pub const FULL_DIMENSION: usize = 3072;

pub fn text_object(key: &str) -> SourceObject {
    let location = ObjectLocation::new("uploads", key);
    SourceObject {
        file_name: location.file_name().to_string(),
        file_type: location.extension(),
        object_id: SourceObject::generate_object_id(key, Utc::now()),
        location,
        size_bytes: 11,
        uploaded_at: Utc::now(),
        content_type: "text/plain".into(),
        page: None,
    }
}

/// Deterministic non-zero vector; `seed` varies the direction.
pub fn full_vector(seed: usize) -> Vec<f32> {
    (0..FULL_DIMENSION)
        .map(|i| 1.0 / ((i + seed + 1) as f32))
        .collect()
}

// ---------------------------------------------------------------------------
// Blob store
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryBlobs {
    objects: Arc<Mutex<HashMap<ObjectLocation, (Vec<u8>, Option<String>)>>>,
    fetched: Arc<Mutex<Vec<ObjectLocation>>>,
}

impl MemoryBlobs {
    pub fn put(&self, location: &ObjectLocation, bytes: impl Into<Vec<u8>>, content_type: Option<&str>) {
        self.objects
            .lock()
            .unwrap()
            .insert(location.clone(), (bytes.into(), content_type.map(str::to_string)));
    }

    /// Locations whose bytes were downloaded, in call order.
    pub fn fetched(&self) -> Vec<ObjectLocation> {
        self.fetched.lock().unwrap().clone()
    }
}

impl BlobStore for MemoryBlobs {
    async fn head(&self, location: &ObjectLocation) -> Result<BlobInfo, ServiceError> {
        let objects = self.objects.lock().unwrap();
        let (bytes, content_type) = objects
            .get(location)
            .ok_or_else(|| ServiceError::NotFound(location.uri()))?;
        Ok(BlobInfo {
            size_bytes: bytes.len() as u64,
            last_modified: Utc::now(),
            content_type: content_type.clone(),
        })
    }

    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ServiceError> {
        self.fetched.lock().unwrap().push(location.clone());
        self.objects
            .lock()
            .unwrap()
            .get(location)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| ServiceError::NotFound(location.uri()))
    }

    async fn list(&self, prefix: &ObjectLocation) -> Result<Vec<ObjectLocation>, ServiceError> {
        let mut found: Vec<ObjectLocation> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|l| l.bucket == prefix.bucket && l.key.starts_with(&prefix.key))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// Embedding service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EmbedderState {
    statuses: VecDeque<String>,
    failure_message: Option<String>,
    submitted: Vec<(JobRequest, ObjectLocation)>,
    status_checks: usize,
    jobs: usize,
    fail_sources: Vec<String>,
    outputs: Option<MemoryBlobs>,
    text_segments: usize,
    query_vector: Option<Vec<f32>>,
    query_dimensions: Vec<usize>,
}

/// Scripted embedding service. Status checks pop from the script and report
/// `Completed` once it runs out. With outputs attached, each submitted job
/// writes a manifest and segment file into the blob store.
#[derive(Clone, Default)]
pub struct MockEmbedder {
    state: Arc<Mutex<EmbedderState>>,
}

impl MockEmbedder {
    pub fn with_statuses(statuses: &[&str]) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().statuses = statuses.iter().map(|s| s.to_string()).collect();
        mock
    }

    pub fn writing_to(blobs: &MemoryBlobs) -> Self {
        let mock = Self::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.outputs = Some(blobs.clone());
            state.text_segments = 2;
        }
        mock
    }

    pub fn failure_message(self, message: &str) -> Self {
        self.state.lock().unwrap().failure_message = Some(message.to_string());
        self
    }

    /// Reject submissions whose source uri contains `needle`.
    pub fn fail_source(self, needle: &str) -> Self {
        self.state.lock().unwrap().fail_sources.push(needle.to_string());
        self
    }

    pub fn query_vector(self, vector: Vec<f32>) -> Self {
        self.state.lock().unwrap().query_vector = Some(vector);
        self
    }

    pub fn status_checks(&self) -> usize {
        self.state.lock().unwrap().status_checks
    }

    pub fn submitted(&self) -> Vec<(JobRequest, ObjectLocation)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn query_dimensions(&self) -> Vec<usize> {
        self.state.lock().unwrap().query_dimensions.clone()
    }
}

fn source_uri(request: &JobRequest) -> &str {
    match &request.segmented_embedding_params.modality {
        ModalityConfig::Text(c) => &c.source.s3_location.uri,
        ModalityConfig::Image(c) => &c.source.s3_location.uri,
        ModalityConfig::Video(c) => &c.source.s3_location.uri,
        ModalityConfig::Audio(c) => &c.source.s3_location.uri,
    }
}

fn write_job_output(blobs: &MemoryBlobs, request: &JobRequest, job_dir: &ObjectLocation, text_segments: usize) {
    let (embedding_type, lines): (&str, Vec<serde_json::Value>) =
        match &request.segmented_embedding_params.modality {
            ModalityConfig::Text(_) => (
                "TEXT",
                (0..text_segments)
                    .map(|i| {
                        serde_json::json!({
                            "embedding": full_vector(i),
                            "segmentMetadata": {
                                "segmentIndex": i,
                                "segmentStartCharPosition": i * 100,
                                "segmentEndCharPosition": i * 100 + 99
                            },
                            "status": "SUCCESS"
                        })
                    })
                    .collect(),
            ),
            ModalityConfig::Image(_) => (
                "IMAGE",
                vec![serde_json::json!({
                    "embedding": full_vector(7),
                    "segmentMetadata": {"segmentIndex": 0},
                    "status": "SUCCESS"
                })],
            ),
            ModalityConfig::Video(_) | ModalityConfig::Audio(_) => (
                "VIDEO",
                vec![serde_json::json!({
                    "embedding": full_vector(3),
                    "segmentMetadata": {"segmentIndex": 0, "segmentStartSeconds": 0.0, "segmentEndSeconds": 5.0},
                    "status": "SUCCESS"
                })],
            ),
        };

    let segments = job_dir.join("embedding-segments.jsonl");
    let body: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    blobs.put(&segments, body.join("\n"), None);

    let manifest = serde_json::json!({
        "sourceFileUri": source_uri(request),
        "embeddingDimension": FULL_DIMENSION,
        "embeddingResults": [{
            "embeddingType": embedding_type,
            "status": "SUCCESS",
            "outputFileUri": segments.uri()
        }]
    });
    blobs.put(&job_dir.join(RESULT_MANIFEST), manifest.to_string(), None);
}

impl EmbeddingService for MockEmbedder {
    fn model_id(&self) -> &str {
        "mock-embed"
    }

    async fn start_job(&self, request: &JobRequest, output: &ObjectLocation) -> Result<String, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let uri = source_uri(request).to_string();
        if state.fail_sources.iter().any(|n| uri.contains(n.as_str())) {
            return Err(ServiceError::Request(format!("rejected {uri}")));
        }
        state.jobs += 1;
        let invocation = format!("job-{}", state.jobs);
        state.submitted.push((request.clone(), output.clone()));
        if let Some(blobs) = &state.outputs {
            write_job_output(blobs, request, &output.join(&invocation), state.text_segments);
        }
        Ok(format!("arn:aws:bedrock:us-east-1:000000000000:async-invoke/{invocation}"))
    }

    async fn job_status(&self, _handle: &str) -> Result<JobStatusReport, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.status_checks += 1;
        let status = state.statuses.pop_front().unwrap_or_else(|| "Completed".to_string());
        let failure = if status == "Failed" {
            state.failure_message.clone()
        } else {
            None
        };
        Ok(JobStatusReport::from_external(status, failure))
    }

    async fn embed_text(&self, _text: &str, dimension: usize) -> Result<Vec<f32>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.query_dimensions.push(dimension);
        let full = state.query_vector.clone().unwrap_or_else(|| full_vector(0));
        Ok(full.into_iter().take(dimension).collect())
    }
}

/// Embedding service whose status endpoint is unreachable.
pub struct UnreachableStatus;

impl EmbeddingService for UnreachableStatus {
    fn model_id(&self) -> &str {
        "unreachable"
    }

    async fn start_job(&self, _request: &JobRequest, _output: &ObjectLocation) -> Result<String, ServiceError> {
        Ok("arn:aws:bedrock:us-east-1:0:async-invoke/lost".to_string())
    }

    async fn job_status(&self, _handle: &str) -> Result<JobStatusReport, ServiceError> {
        Err(ServiceError::Request("connection reset".into()))
    }

    async fn embed_text(&self, _text: &str, _dimension: usize) -> Result<Vec<f32>, ServiceError> {
        Err(ServiceError::Request("connection reset".into()))
    }
}

// ---------------------------------------------------------------------------
// Vector index
// ---------------------------------------------------------------------------

#[derive(Default)]
struct IndexState {
    stored: Vec<StoredVector>,
    results: HashMap<usize, Vec<IndexMatch>>,
    queries: Vec<(usize, usize)>,
    lookups: Vec<(usize, Vec<String>)>,
    fail_puts: bool,
}

/// Records writes and answers queries from a per-dimension script.
#[derive(Clone)]
pub struct MockIndex {
    state: Arc<Mutex<IndexState>>,
    returns_vectors: bool,
}

impl Default for MockIndex {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            returns_vectors: false,
        }
    }
}

impl MockIndex {
    pub fn returning_vectors() -> Self {
        Self {
            returns_vectors: true,
            ..Self::default()
        }
    }

    pub fn failing_puts() -> Self {
        let index = Self::default();
        index.state.lock().unwrap().fail_puts = true;
        index
    }

    pub fn script(&self, dimension: usize, matches: Vec<IndexMatch>) {
        self.state.lock().unwrap().results.insert(dimension, matches);
    }

    pub fn stored(&self) -> Vec<StoredVector> {
        self.state.lock().unwrap().stored.clone()
    }

    pub fn queries(&self) -> Vec<(usize, usize)> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Store a bare vector, bypassing the put-failure switch.
    pub fn put_vector(&self, dimension: usize, key: &str, vector: Vec<f32>) {
        self.state.lock().unwrap().stored.push(StoredVector {
            key: key.to_string(),
            dimension,
            vector,
            metadata: Default::default(),
        });
    }

    pub fn lookups(&self) -> Vec<(usize, Vec<String>)> {
        self.state.lock().unwrap().lookups.clone()
    }
}

impl VectorIndex for MockIndex {
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    fn returns_vectors(&self) -> bool {
        self.returns_vectors
    }

    async fn put(&self, vectors: &[StoredVector]) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_puts {
            return Err(ServiceError::Index("write rejected".into()));
        }
        for v in vectors {
            state
                .stored
                .retain(|s| !(s.key == v.key && s.dimension == v.dimension));
            state.stored.push(v.clone());
        }
        Ok(())
    }

    async fn query(&self, dimension: usize, _vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push((dimension, top_k));
        let mut matches = state.results.get(&dimension).cloned().unwrap_or_default();
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn vectors(&self, dimension: usize, keys: &[String]) -> Result<HashMap<String, Vec<f32>>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push((dimension, keys.to_vec()));
        Ok(state
            .stored
            .iter()
            .filter(|v| v.dimension == dimension && keys.contains(&v.key))
            .map(|v| (v.key.clone(), v.vector.clone()))
            .collect())
    }

    async fn count(&self, dimension: usize) -> Result<usize, ServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .results
            .get(&dimension)
            .map(Vec::len)
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Extractor, scheduler, generator
// ---------------------------------------------------------------------------

/// Resolves documents to a fixed set of rendered pages.
#[derive(Clone, Default)]
pub struct MockExtractor {
    pub pages: Vec<ObjectLocation>,
    pub text: Option<ObjectLocation>,
}

impl DocumentExtractor for MockExtractor {
    async fn pages(&self, _document: &SourceObject) -> Result<Vec<ObjectLocation>, ServiceError> {
        Ok(self.pages.clone())
    }

    async fn extracted_text(&self, document: &SourceObject) -> Result<ObjectLocation, ServiceError> {
        self.text
            .clone()
            .ok_or_else(|| ServiceError::NotFound(format!("no text for {}", document.location)))
    }
}

#[derive(Clone, Default)]
pub struct InstantScheduler {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl InstantScheduler {
    pub fn waits(&self) -> usize {
        self.waits.lock().unwrap().len()
    }
}

impl Scheduler for InstantScheduler {
    async fn wait(&self, delay: Duration) {
        self.waits.lock().unwrap().push(delay);
    }
}

/// Scheduler that holds each wait briefly and records the most waits that
/// overlapped.
#[derive(Clone, Default)]
pub struct CountingScheduler {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl CountingScheduler {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Scheduler for CountingScheduler {
    async fn wait(&self, _delay: Duration) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scheduler whose waits never finish.
pub struct StalledScheduler;

impl Scheduler for StalledScheduler {
    async fn wait(&self, _delay: Duration) {
        std::future::pending::<()>().await;
    }
}

/// Generator that echoes how many content blocks it received.
#[derive(Clone, Default)]
pub struct EchoGenerator {
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl EchoGenerator {
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerationProvider for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(GenerationResponse {
            text: format!("answer from {} blocks", request.content.len()),
            model: "echo-model".into(),
        })
    }
}
