//! In-memory port implementations shared by the core tests.

use crate::domain::model::{
    Garment, GarmentCategory, GarmentClassification, GarmentKind, ImageData, OutfitPairing,
    OutfitSet, PhotoType, QueryRequirements, SearchHit, SearchKeywords, UserProfile,
};
use crate::domain::ports::{GarmentSearch, ImageFetcher, StylistModel, TryOnRenderer};
use crate::utils::error::{Result, StylistError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Image whose bytes are a readable tag; the mocks never sniff content.
pub fn tagged_image(tag: &str) -> ImageData {
    ImageData {
        bytes: tag.as_bytes().to_vec(),
        mime: "image/png".to_string(),
    }
}

pub fn tag_of(image: &ImageData) -> String {
    String::from_utf8_lossy(&image.bytes).into_owned()
}

pub fn hit(title: &str, url: &str, image_url: Option<&str>) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        snippet: String::new(),
        image_url: image_url.map(str::to_string),
        price: None,
    }
}

pub fn garment(title: &str, url: &str) -> Garment {
    Garment {
        hit: hit(title, url, Some(&format!("https://img.example.com/{}.jpg", title))),
        image: tagged_image(title),
    }
}

#[derive(Default)]
pub struct MockModel {
    pub requirements: QueryRequirements,
    pub keywords: SearchKeywords,
    pub pairing: Option<OutfitPairing>,
    pub classification: GarmentClassification,
    pub detected_profile: UserProfile,
    pub calls: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl StylistModel for MockModel {
    async fn analyze_query(&self, query: &str) -> QueryRequirements {
        self.record(format!("analyze_query:{}", query));
        self.requirements.clone()
    }

    async fn generate_search_keywords(
        &self,
        profile: &UserProfile,
        _requirements: &QueryRequirements,
    ) -> SearchKeywords {
        self.record(format!("keywords:{}", profile.body_shape));
        self.keywords.clone()
    }

    async fn recommend_outfit_sets(
        &self,
        tops: &[Garment],
        bottoms: &[Garment],
        _profile: &UserProfile,
        _requirements: &QueryRequirements,
        num_sets: usize,
    ) -> OutfitPairing {
        self.record(format!("pairing:{}x{}:{}", tops.len(), bottoms.len(), num_sets));
        self.pairing.clone().unwrap_or_else(|| OutfitPairing {
            outfit_sets: vec![OutfitSet {
                top_index: 0,
                bottom_index: 0,
                reasoning: "Great combination!".to_string(),
            }],
            overall_styling_tips: String::new(),
        })
    }

    async fn classify_garment(&self, image: &ImageData) -> GarmentClassification {
        self.record(format!("classify:{}", tag_of(image)));
        self.classification.clone()
    }

    async fn analyze_user_image(&self, image: &ImageData) -> UserProfile {
        self.record(format!("analyze_user_image:{}", tag_of(image)));
        self.detected_profile.clone()
    }
}

#[derive(Default)]
pub struct MockSearch {
    pub results: HashMap<(GarmentKind, String), Vec<SearchHit>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn with(mut self, kind: GarmentKind, keywords: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert((kind, keywords.to_string()), hits);
        self
    }
}

#[async_trait]
impl GarmentSearch for MockSearch {
    async fn search(&self, kind: GarmentKind, keywords: &str, num_results: usize) -> Vec<SearchHit> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", kind, keywords, num_results));
        self.results
            .get(&(kind, keywords.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Serves `tagged_image(<last path segment>)` for every URL not marked broken.
#[derive(Default)]
pub struct MockFetcher {
    pub broken: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageData> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.broken.iter().any(|b| b == url) {
            return Err(StylistError::image(format!("cannot download {}", url)));
        }
        let name = url.rsplit('/').next().unwrap_or(url).trim_end_matches(".jpg");
        Ok(tagged_image(name))
    }
}

/// Renders by concatenating tags, so chained try-ons are visible in the output.
#[derive(Default)]
pub struct MockRenderer {
    pub fail_with: Option<String>,
    pub calls: Mutex<Vec<(String, GarmentCategory, PhotoType)>>,
}

#[async_trait]
impl TryOnRenderer for MockRenderer {
    async fn render(
        &self,
        person: &ImageData,
        garment: &ImageData,
        category: GarmentCategory,
        photo_type: PhotoType,
    ) -> Result<ImageData> {
        self.calls
            .lock()
            .unwrap()
            .push((tag_of(garment), category, photo_type));
        if let Some(message) = &self.fail_with {
            return Err(StylistError::TryOnFailed {
                job_id: "mock".to_string(),
                message: message.clone(),
            });
        }
        Ok(tagged_image(&format!("{}+{}", tag_of(person), tag_of(garment))))
    }
}
