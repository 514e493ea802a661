//! Google Gemini client for the stylist model: query analysis, keyword
//! generation, outfit pairing and image classification over the
//! `generateContent` REST endpoint.

mod types;

use crate::adapters::{build_http_client, truncate_body};
use crate::config::{GeminiConfig, GEMINI_API_KEY_ENV};
use crate::core::json::{extract_json, get_index, get_str, get_str_list};
use crate::core::prompts;
use crate::domain::model::{
    BodyShape, Garment, GarmentCategory, GarmentClassification, Gender, ImageData, OutfitPairing,
    OutfitSet, PhotoType, QueryRequirements, SearchKeywords, SkinTone, UserProfile,
};
use crate::domain::ports::StylistModel;
use crate::utils::error::{Result, StylistError};
use crate::utils::validation::require_api_key;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

const PROVIDER: &str = "Gemini";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = require_api_key(GEMINI_API_KEY_ENV, &config.api_key)?.to_string();
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// Sends one user turn and returns the concatenated text of the first candidate.
    async fn generate(&self, system: Option<&str>, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part::text(s)],
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        tracing::debug!("Calling Gemini model {}", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<GenerateContentResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or_else(|| truncate_body(&body));
            return Err(StylistError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, message),
            ));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        if let Some(error) = parsed.error {
            return Err(StylistError::provider(PROVIDER, error.message));
        }

        let candidate = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| StylistError::provider(PROVIDER, "response has no candidates"))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(StylistError::provider(
                PROVIDER,
                format!(
                    "empty response (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        Ok(text)
    }

    async fn generate_json(&self, system: Option<&str>, parts: Vec<Part>) -> Result<Map<String, Value>> {
        let text = self.generate(system, parts).await?;
        Ok(extract_json(&text))
    }
}

fn image_part(image: &ImageData) -> Part {
    Part::image(&image.mime, image.to_base64())
}

fn requirements_from_json(map: &Map<String, Value>) -> QueryRequirements {
    let defaults = QueryRequirements::default();
    QueryRequirements {
        style: get_str(map, "style").unwrap_or(defaults.style),
        occasion: get_str(map, "occasion").unwrap_or(defaults.occasion),
        weather: get_str(map, "weather").unwrap_or(defaults.weather),
        items: get_str_list(map, "items").unwrap_or(defaults.items),
        colors: get_str_list(map, "colors").unwrap_or(defaults.colors),
        budget: get_str(map, "budget").unwrap_or(defaults.budget),
    }
}

/// Keywords used when the model leaves a list out.
fn fallback_keywords(
    profile: &UserProfile,
    requirements: &QueryRequirements,
) -> (Vec<String>, Vec<String>) {
    let gender = profile.gender.as_str();
    let style = requirements.style.as_str();
    let occasion = requirements.occasion.as_str();
    let phrase = |words: &[&str]| {
        words
            .iter()
            .filter(|w| !w.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    };

    if !requirements.items.is_empty() {
        let items: Vec<String> = requirements
            .items
            .iter()
            .take(3)
            .map(|item| phrase(&[gender, style, item.as_str()]))
            .collect();
        return (items.clone(), items);
    }

    (
        vec![phrase(&[gender, style, "top"]), phrase(&[gender, occasion, "shirt"])],
        vec![
            phrase(&[gender, style, "pants"]),
            phrase(&[gender, occasion, "bottoms"]),
        ],
    )
}

fn keywords_from_json(
    map: &Map<String, Value>,
    profile: &UserProfile,
    requirements: &QueryRequirements,
) -> SearchKeywords {
    let (fallback_tops, fallback_bottoms) = fallback_keywords(profile, requirements);
    let non_empty = |list: Option<Vec<String>>| list.filter(|l| !l.is_empty());

    SearchKeywords {
        tops_keywords: non_empty(get_str_list(map, "tops_keywords")).unwrap_or(fallback_tops),
        bottoms_keywords: non_empty(get_str_list(map, "bottoms_keywords"))
            .unwrap_or(fallback_bottoms),
        recommended_colors: get_str_list(map, "recommended_colors").unwrap_or_default(),
        reasoning: get_str(map, "reasoning").unwrap_or_default(),
    }
}

/// Positional pairs used when the model gives no usable sets.
fn positional_sets(num_tops: usize, num_bottoms: usize, num_sets: usize) -> Vec<OutfitSet> {
    if num_tops == 0 || num_bottoms == 0 {
        return Vec::new();
    }
    (0..num_sets.min(num_tops.max(num_bottoms)))
        .map(|i| OutfitSet {
            top_index: i % num_tops,
            bottom_index: i % num_bottoms,
            reasoning: "Great combination!".to_string(),
        })
        .collect()
}

fn pairing_from_json(
    map: &Map<String, Value>,
    num_tops: usize,
    num_bottoms: usize,
    num_sets: usize,
) -> OutfitPairing {
    let mut outfit_sets: Vec<OutfitSet> = map
        .get("outfit_sets")
        .and_then(Value::as_array)
        .map(|sets| {
            sets.iter()
                .filter_map(|set| {
                    let top_index = set.get("top_index").and_then(get_index)?;
                    let bottom_index = set.get("bottom_index").and_then(get_index)?;
                    if top_index >= num_tops || bottom_index >= num_bottoms {
                        tracing::warn!(
                            "Dropping outfit set with out-of-range indices ({}, {})",
                            top_index,
                            bottom_index
                        );
                        return None;
                    }
                    let reasoning = set
                        .get("reasoning")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .unwrap_or("Great combination!")
                        .to_string();
                    Some(OutfitSet {
                        top_index,
                        bottom_index,
                        reasoning,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    outfit_sets.truncate(num_sets);
    if outfit_sets.is_empty() {
        outfit_sets = positional_sets(num_tops, num_bottoms, num_sets);
    }

    OutfitPairing {
        outfit_sets,
        overall_styling_tips: get_str(map, "overall_styling_tips").unwrap_or_default(),
    }
}

fn classification_from_json(map: &Map<String, Value>) -> GarmentClassification {
    let defaults = GarmentClassification::default();
    GarmentClassification {
        category: get_str(map, "category")
            .and_then(|c| GarmentCategory::parse(&c))
            .unwrap_or(defaults.category),
        photo_type: get_str(map, "photo_type")
            .and_then(|p| PhotoType::parse(&p))
            .unwrap_or(defaults.photo_type),
        description: get_str(map, "description").unwrap_or_default(),
    }
}

fn profile_from_json(map: &Map<String, Value>) -> UserProfile {
    let defaults = UserProfile::default();
    UserProfile {
        gender: get_str(map, "gender")
            .and_then(|g| Gender::parse_lenient(&g))
            .unwrap_or(defaults.gender),
        body_shape: get_str(map, "body_shape")
            .and_then(|b| BodyShape::parse_lenient(&b))
            .unwrap_or(defaults.body_shape),
        skin_tone: get_str(map, "skin_tone")
            .and_then(|s| SkinTone::parse_lenient(&s))
            .unwrap_or(defaults.skin_tone),
        current_style: get_str(map, "current_style").or_else(|| Some("casual".to_string())),
    }
}

#[async_trait]
impl StylistModel for GeminiClient {
    async fn analyze_query(&self, query: &str) -> QueryRequirements {
        match self
            .generate_json(None, vec![Part::text(prompts::query_analysis(query))])
            .await
        {
            Ok(map) => requirements_from_json(&map),
            Err(e) => {
                tracing::warn!("Error analyzing query, using defaults: {}", e);
                QueryRequirements::default()
            }
        }
    }

    async fn generate_search_keywords(
        &self,
        profile: &UserProfile,
        requirements: &QueryRequirements,
    ) -> SearchKeywords {
        let prompt = prompts::search_keywords(profile, requirements);
        match self.generate_json(None, vec![Part::text(prompt)]).await {
            Ok(map) => keywords_from_json(&map, profile, requirements),
            Err(e) => {
                tracing::warn!("Error generating search keywords, using defaults: {}", e);
                SearchKeywords {
                    tops_keywords: vec!["casual shirt".to_string()],
                    bottoms_keywords: vec!["casual pants".to_string()],
                    recommended_colors: Vec::new(),
                    reasoning: "Default keywords due to error".to_string(),
                }
            }
        }
    }

    async fn recommend_outfit_sets(
        &self,
        tops: &[Garment],
        bottoms: &[Garment],
        profile: &UserProfile,
        requirements: &QueryRequirements,
        num_sets: usize,
    ) -> OutfitPairing {
        let prompt = prompts::outfit_pairing(tops, bottoms, profile, requirements, num_sets);
        let map = match self
            .generate_json(Some(prompts::STYLIST_SYSTEM_PROMPT), vec![Part::text(prompt)])
            .await
        {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Error recommending outfit sets, pairing by position: {}", e);
                Map::new()
            }
        };
        pairing_from_json(&map, tops.len(), bottoms.len(), num_sets)
    }

    async fn classify_garment(&self, image: &ImageData) -> GarmentClassification {
        let parts = vec![
            Part::text(prompts::GARMENT_CLASSIFICATION_PROMPT),
            image_part(image),
        ];
        match self.generate_json(None, parts).await {
            Ok(map) => classification_from_json(&map),
            Err(e) => {
                tracing::warn!("Error classifying garment: {}", e);
                GarmentClassification::default()
            }
        }
    }

    async fn analyze_user_image(&self, image: &ImageData) -> UserProfile {
        let parts = vec![Part::text(prompts::USER_ANALYSIS_PROMPT), image_part(image)];
        match self.generate_json(None, parts).await {
            Ok(map) => profile_from_json(&map),
            Err(e) => {
                tracing::warn!("Error analyzing user image: {}", e);
                UserProfile {
                    current_style: Some("casual".to_string()),
                    ..UserProfile::default()
                }
            }
        }
    }
}
