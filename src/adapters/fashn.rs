use crate::adapters::{build_http_client, truncate_body};
use crate::config::{VtoConfig, FASHN_API_KEY_ENV};
use crate::domain::model::{GarmentCategory, ImageData, PhotoType};
use crate::domain::ports::{ImageFetcher, TryOnRenderer};
use crate::utils::error::{Result, StylistError};
use crate::utils::validation::require_api_key;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "FASHN";

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    model_name: &'a str,
    inputs: RunInputs<'a>,
}

#[derive(Debug, Serialize)]
struct RunInputs<'a> {
    model_image: String,
    garment_image: String,
    category: &'a str,
    garment_photo_type: &'a str,
    mode: &'a str,
    seed: u64,
    num_samples: u32,
    return_base64: bool,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    id: Option<String>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    output: Option<Vec<String>>,
    error: Option<ErrorDetail>,
}

/// FASHN reports errors either as a string or as `{name, message}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Structured {
        #[serde(default)]
        name: Option<String>,
        message: String,
    },
}

impl ErrorDetail {
    fn describe(&self) -> String {
        match self {
            Self::Message(message) => message.clone(),
            Self::Structured {
                name: Some(name),
                message,
            } => format!("{}: {}", name, message),
            Self::Structured { message, .. } => message.clone(),
        }
    }
}

/// Virtual try-on through the FASHN API: submit a job, poll its status,
/// then decode or download the first output image.
pub struct FashnClient {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
    mode: String,
    seed: u64,
    poll_interval: Duration,
    max_poll_attempts: u32,
    fetcher: Arc<dyn ImageFetcher>,
}

impl FashnClient {
    pub fn new(config: &VtoConfig, fetcher: Arc<dyn ImageFetcher>) -> Result<Self> {
        let api_key = require_api_key(FASHN_API_KEY_ENV, &config.api_key)?.to_string();
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            mode: config.mode.clone(),
            seed: config.seed,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts,
            fetcher,
        })
    }

    async fn submit(
        &self,
        person: &ImageData,
        garment: &ImageData,
        category: GarmentCategory,
        photo_type: PhotoType,
    ) -> Result<String> {
        let request = RunRequest {
            model_name: &self.model_name,
            inputs: RunInputs {
                model_image: person.to_data_url(),
                garment_image: garment.to_data_url(),
                category: category.as_str(),
                garment_photo_type: photo_type.as_str(),
                mode: &self.mode,
                seed: self.seed,
                num_samples: 1,
                return_base64: true,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/run", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StylistError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, truncate_body(&body)),
            ));
        }

        let run: RunResponse = serde_json::from_str(&body)?;
        if let Some(error) = run.error {
            return Err(StylistError::provider(PROVIDER, error.describe()));
        }
        run.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StylistError::provider(PROVIDER, "run response has no job id"))
    }

    async fn poll(&self, job_id: &str) -> Result<String> {
        for attempt in 1..=self.max_poll_attempts {
            let response = self
                .client
                .get(format!("{}/v1/status/{}", self.base_url, job_id))
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?;
            let status: StatusResponse = response.json().await?;

            match status.status.as_str() {
                "completed" => {
                    return status
                        .output
                        .and_then(|outputs| outputs.into_iter().next())
                        .ok_or_else(|| StylistError::TryOnFailed {
                            job_id: job_id.to_string(),
                            message: "completed without output".to_string(),
                        });
                }
                "failed" | "canceled" => {
                    return Err(StylistError::TryOnFailed {
                        job_id: job_id.to_string(),
                        message: status
                            .error
                            .map(|e| e.describe())
                            .unwrap_or_else(|| status.status.clone()),
                    });
                }
                other => {
                    tracing::debug!(
                        "Try-on job {} is {} (check {}/{})",
                        job_id,
                        other,
                        attempt,
                        self.max_poll_attempts
                    );
                }
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(StylistError::TryOnTimeout {
            job_id: job_id.to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    async fn load_output(&self, output: &str) -> Result<ImageData> {
        if output.starts_with("data:") {
            ImageData::from_data_url(output)
        } else {
            self.fetcher.fetch(output).await
        }
    }
}

#[async_trait]
impl TryOnRenderer for FashnClient {
    async fn render(
        &self,
        person: &ImageData,
        garment: &ImageData,
        category: GarmentCategory,
        photo_type: PhotoType,
    ) -> Result<ImageData> {
        tracing::info!(
            "Running try-on: category={}, photo_type={}",
            category,
            photo_type
        );
        let job_id = self.submit(person, garment, category, photo_type).await?;
        tracing::debug!("Submitted try-on job {}", job_id);

        let output = self.poll(&job_id).await?;
        let image = self.load_output(&output).await?;
        tracing::info!("Try-on job {} finished ({} bytes)", job_id, image.bytes.len());
        Ok(image)
    }
}
