//! BedrockEmbeddingClient -- concrete [`EmbeddingService`] for AWS Bedrock.
//!
//! Segmented embedding jobs go through the async-invoke API: the job reads
//! its source from blob storage and writes a result manifest plus
//! per-modality JSONL files under the requested output prefix. Query
//! embeddings use a synchronous `SINGLE_EMBEDDING` model invocation.

use secrecy::SecretString;
use tracing::Instrument;

use strata_core::embedding::service::EmbeddingService;
use strata_observe::genai_attrs;
use strata_types::error::ServiceError;
use strata_types::job::{JobRequest, JobStatusReport};
use strata_types::media::ObjectLocation;

use super::transport::{BedrockTransport, TransportError};
use super::types::{
    AsyncInvokeStatus, EmbeddingResponse, OutputDataConfig, S3OutputDataConfig, SingleEmbeddingRequest,
    StartAsyncInvokeRequest, StartAsyncInvokeResponse,
};

/// Multimodal embedding model served by Bedrock.
///
/// Does not derive Debug: the transport holds the bearer token.
pub struct BedrockEmbeddingClient {
    transport: BedrockTransport,
    model_id: String,
}

impl BedrockEmbeddingClient {
    pub fn new(api_key: &SecretString, model_id: impl Into<String>, region: &str) -> Result<Self, ServiceError> {
        let transport = BedrockTransport::new(api_key, region).map_err(map_transport_error)?;
        Ok(Self {
            transport,
            model_id: model_id.into(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.transport = self.transport.with_endpoint(endpoint);
        self
    }

    pub fn region(&self) -> &str {
        self.transport.region()
    }

    fn start_request<'a>(&'a self, request: &'a JobRequest, output: &ObjectLocation) -> StartAsyncInvokeRequest<'a> {
        StartAsyncInvokeRequest {
            model_id: &self.model_id,
            model_input: request,
            output_data_config: OutputDataConfig {
                s3_output_data_config: S3OutputDataConfig { s3_uri: output.uri() },
            },
        }
    }
}

impl EmbeddingService for BedrockEmbeddingClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn start_job(&self, request: &JobRequest, output: &ObjectLocation) -> Result<String, ServiceError> {
        let span = tracing::info_span!(
            "gen_ai.start_embedding_job",
            gen_ai.operation.name = genai_attrs::OP_START_EMBEDDING_JOB,
            gen_ai.provider.name = genai_attrs::PROVIDER_BEDROCK,
            gen_ai.request.model = %self.model_id,
            gen_ai.request.embedding.dimension = request.segmented_embedding_params.embedding_dimension,
            output = %output,
        );
        async {
            let url = self.transport.url(&["async-invoke"]).map_err(map_transport_error)?;
            let response: StartAsyncInvokeResponse = self
                .transport
                .post_json(url, &self.start_request(request, output))
                .await
                .map_err(map_transport_error)?;
            tracing::info!(invocation_arn = %response.invocation_arn, "embedding job started");
            Ok(response.invocation_arn)
        }
        .instrument(span)
        .await
    }

    async fn job_status(&self, handle: &str) -> Result<JobStatusReport, ServiceError> {
        let span = tracing::debug_span!(
            "gen_ai.get_embedding_job",
            gen_ai.operation.name = genai_attrs::OP_GET_EMBEDDING_JOB,
            gen_ai.provider.name = genai_attrs::PROVIDER_BEDROCK,
            invocation_arn = %handle,
        );
        async {
            let url = self
                .transport
                .url(&["async-invoke", handle])
                .map_err(map_transport_error)?;
            let status: AsyncInvokeStatus = self.transport.get_json(url).await.map_err(map_transport_error)?;
            tracing::debug!(status = %status.status, "embedding job status");
            Ok(to_report(status))
        }
        .instrument(span)
        .await
    }

    async fn embed_text(&self, text: &str, dimension: usize) -> Result<Vec<f32>, ServiceError> {
        let span = tracing::info_span!(
            "gen_ai.embed",
            gen_ai.operation.name = genai_attrs::OP_EMBED,
            gen_ai.provider.name = genai_attrs::PROVIDER_BEDROCK,
            gen_ai.request.model = %self.model_id,
            gen_ai.request.embedding.dimension = dimension,
        );
        async {
            let url = self
                .transport
                .url(&["model", &self.model_id, "invoke"])
                .map_err(map_transport_error)?;
            let response: EmbeddingResponse = self
                .transport
                .post_json(url, &SingleEmbeddingRequest::for_query(text, dimension))
                .await
                .map_err(map_transport_error)?;
            first_embedding(response)
        }
        .instrument(span)
        .await
    }
}

fn to_report(status: AsyncInvokeStatus) -> JobStatusReport {
    let mut report = JobStatusReport::from_external(status.status, status.failure_message);
    report.submit_time = status.submit_time;
    report.last_modified_time = status.last_modified_time;
    report
}

fn first_embedding(response: EmbeddingResponse) -> Result<Vec<f32>, ServiceError> {
    response
        .embeddings
        .into_iter()
        .next()
        .map(|e| e.embedding)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Malformed("response contained no embedding".to_string()))
}

fn map_transport_error(e: TransportError) -> ServiceError {
    match e {
        TransportError::Status { status: 401 | 403, .. } => ServiceError::Authentication,
        TransportError::Status { status: 429, .. } => ServiceError::RateLimited,
        TransportError::Status { status: 404, body } => ServiceError::NotFound(body),
        TransportError::Decode(msg) => ServiceError::Malformed(msg),
        other => ServiceError::Request(other.to_string()),
    }
}
