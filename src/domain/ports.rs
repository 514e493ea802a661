use crate::domain::model::{
    Garment, GarmentCategory, GarmentClassification, GarmentKind, ImageData, OutfitPairing,
    PhotoType, QueryRequirements, SearchHit, SearchKeywords, UserProfile,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// LLM analyzer. Every method degrades to defaults instead of failing, so the
/// pipeline keeps going when the model misbehaves.
#[async_trait]
pub trait StylistModel: Send + Sync {
    async fn analyze_query(&self, query: &str) -> QueryRequirements;

    async fn generate_search_keywords(
        &self,
        profile: &UserProfile,
        requirements: &QueryRequirements,
    ) -> SearchKeywords;

    async fn recommend_outfit_sets(
        &self,
        tops: &[Garment],
        bottoms: &[Garment],
        profile: &UserProfile,
        requirements: &QueryRequirements,
        num_sets: usize,
    ) -> OutfitPairing;

    async fn classify_garment(&self, image: &ImageData) -> GarmentClassification;

    async fn analyze_user_image(&self, image: &ImageData) -> UserProfile;
}

#[async_trait]
pub trait GarmentSearch: Send + Sync {
    async fn search(&self, kind: GarmentKind, keywords: &str, num_results: usize) -> Vec<SearchHit>;

    /// Runs one search per keyword and merges the hits, keeping the first
    /// occurrence of every page (or image) URL.
    async fn search_many(
        &self,
        kind: GarmentKind,
        keywords_list: &[String],
        results_per_keyword: usize,
    ) -> Vec<SearchHit> {
        let mut seen = std::collections::HashSet::new();
        let mut merged = Vec::new();

        for keywords in keywords_list {
            for hit in self.search(kind, keywords, results_per_keyword).await {
                let Some(key) = hit.dedup_key() else {
                    continue;
                };
                if seen.insert(key.to_string()) {
                    merged.push(hit);
                }
            }
        }

        merged
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ImageData>;
}

#[async_trait]
pub trait TryOnRenderer: Send + Sync {
    async fn render(
        &self,
        person: &ImageData,
        garment: &ImageData,
        category: GarmentCategory,
        photo_type: PhotoType,
    ) -> Result<ImageData>;
}
