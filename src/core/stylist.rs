use crate::config::StylistConfig;
use crate::core::session::StylistSession;
use crate::domain::model::{
    Garment, GarmentKind, GarmentSummary, ImageData, OutfitPairing, OutfitSuggestions,
    SearchHit, SearchKeywords, UserProfile,
};
use crate::domain::ports::{GarmentSearch, ImageFetcher, StylistModel};
use crate::utils::error::{Result, StylistError};
use std::sync::Arc;
use std::time::Instant;

pub const MISSING_PHOTO: &str = "Please upload your photo first!";
pub const MISSING_QUERY: &str = "Please describe what kind of outfit you're looking for!";
pub const NO_GARMENTS: &str = "Could not find any garment images. Try a different search query.";

/// Input of one outfit search.
#[derive(Debug, Clone, Default)]
pub struct FindOutfitsRequest {
    pub photo: Option<ImageData>,
    /// `None` asks the model to read the profile from the photo.
    pub profile: Option<UserProfile>,
    pub query: String,
}

/// Drives the search half of the flow: intent analysis, keyword generation,
/// garment search, image download and top/bottom pairing.
pub struct Stylist {
    model: Arc<dyn StylistModel>,
    search: Arc<dyn GarmentSearch>,
    fetcher: Arc<dyn ImageFetcher>,
    config: StylistConfig,
}

impl Stylist {
    pub fn new(
        model: Arc<dyn StylistModel>,
        search: Arc<dyn GarmentSearch>,
        fetcher: Arc<dyn ImageFetcher>,
        config: StylistConfig,
    ) -> Self {
        Self {
            model,
            search,
            fetcher,
            config,
        }
    }

    /// Runs the whole search and, on success, replaces the session's photo,
    /// profile, garments and outfit sets with the new results.
    pub async fn find_outfits(
        &self,
        session: &mut StylistSession,
        request: FindOutfitsRequest,
    ) -> Result<OutfitSuggestions> {
        let started = Instant::now();

        let photo = request
            .photo
            .ok_or_else(|| StylistError::invalid_input(MISSING_PHOTO))?;
        let query = request.query.trim();
        if query.is_empty() {
            return Err(StylistError::invalid_input(MISSING_QUERY));
        }

        let profile = match request.profile {
            Some(profile) => profile,
            None => {
                tracing::info!("🧍 Analyzing user photo for profile");
                self.model.analyze_user_image(&photo).await
            }
        };

        tracing::info!("🔍 Analyzing request: {}", query);
        let requirements = self.model.analyze_query(query).await;
        tracing::debug!("Requirements: {:?}", requirements);

        let keywords = self
            .model
            .generate_search_keywords(&profile, &requirements)
            .await;
        tracing::info!(
            "🔑 Keywords: tops={:?}, bottoms={:?}",
            keywords.tops_keywords,
            keywords.bottoms_keywords
        );

        let top_hits = self
            .search
            .search_many(
                GarmentKind::Top,
                &keywords.tops_keywords,
                self.config.results_per_keyword,
            )
            .await;
        let bottom_hits = self
            .search
            .search_many(
                GarmentKind::Bottom,
                &keywords.bottoms_keywords,
                self.config.results_per_keyword,
            )
            .await;
        tracing::info!(
            "📡 Search returned {} top and {} bottom candidates",
            top_hits.len(),
            bottom_hits.len()
        );

        let tops = self.download(top_hits, self.config.max_tops).await;
        let bottoms = self.download(bottom_hits, self.config.max_bottoms).await;
        if tops.is_empty() && bottoms.is_empty() {
            tracing::warn!("No garment images could be downloaded for: {}", query);
            return Err(StylistError::invalid_input(NO_GARMENTS));
        }

        let pairing = if !tops.is_empty() && !bottoms.is_empty() {
            self.model
                .recommend_outfit_sets(
                    &tops,
                    &bottoms,
                    &profile,
                    &requirements,
                    self.config.max_full_sets,
                )
                .await
        } else {
            OutfitPairing::default()
        };

        let suggestions = OutfitSuggestions {
            explanation: build_explanation(&profile, &keywords, &pairing),
            status: format!("Found {} tops and {} bottoms!", tops.len(), bottoms.len()),
            tops: summarize(&tops),
            bottoms: summarize(&bottoms),
            outfit_sets: pairing.outfit_sets.clone(),
            profile: profile.clone(),
            requirements,
            keywords,
        };

        tracing::info!(
            "✅ {} ({} full sets) in {:.2}s",
            suggestions.status,
            suggestions.outfit_sets.len(),
            started.elapsed().as_secs_f64()
        );

        session.photo = Some(photo);
        session.profile = profile;
        session.tops = tops;
        session.bottoms = bottoms;
        session.outfit_sets = pairing.outfit_sets;

        Ok(suggestions)
    }

    /// Downloads hit images in order, skipping failures, until `limit` succeed.
    async fn download(&self, hits: Vec<SearchHit>, limit: usize) -> Vec<Garment> {
        let mut garments = Vec::new();
        for hit in hits {
            if garments.len() >= limit {
                break;
            }
            let Some(image_url) = hit.image_url.clone() else {
                continue;
            };
            match self.fetcher.fetch(&image_url).await {
                Ok(image) => garments.push(Garment { hit, image }),
                Err(e) => tracing::warn!("Skipping garment image {}: {}", image_url, e),
            }
        }
        garments
    }
}

fn summarize(garments: &[Garment]) -> Vec<GarmentSummary> {
    garments
        .iter()
        .enumerate()
        .map(|(i, garment)| GarmentSummary::from_garment(i, garment))
        .collect()
}

/// Markdown shown next to the results.
pub fn build_explanation(
    profile: &UserProfile,
    keywords: &SearchKeywords,
    pairing: &OutfitPairing,
) -> String {
    let mut explanation = format!(
        "**For your {} figure and {} skin tone:**\n\n",
        profile.body_shape, profile.skin_tone
    );
    if !keywords.reasoning.is_empty() {
        explanation.push_str(&keywords.reasoning);
        explanation.push_str("\n\n");
    }
    if !keywords.recommended_colors.is_empty() {
        explanation.push_str(&format!(
            "**Recommended colors:** {}\n\n",
            keywords.recommended_colors.join(", ")
        ));
    }
    if !pairing.overall_styling_tips.is_empty() {
        explanation.push_str("**Styling tips:** ");
        explanation.push_str(&pairing.overall_styling_tips);
    }
    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{hit, tagged_image, MockFetcher, MockModel, MockSearch};
    use crate::domain::model::{BodyShape, Gender, OutfitSet, QueryRequirements, SkinTone};

    fn keywords() -> SearchKeywords {
        SearchKeywords {
            tops_keywords: vec!["linen shirt".to_string(), "polo".to_string()],
            bottoms_keywords: vec!["chinos".to_string()],
            recommended_colors: vec!["navy".to_string(), "white".to_string()],
            reasoning: "Relaxed fits suit a summer brunch.".to_string(),
        }
    }

    fn img(name: &str) -> String {
        format!("https://img.example.com/{}.jpg", name)
    }

    fn search() -> MockSearch {
        MockSearch::default()
            .with(
                GarmentKind::Top,
                "linen shirt",
                vec![
                    hit("Linen Shirt", "https://shop.example.com/linen", Some(&img("linen"))),
                    hit("No Image", "https://shop.example.com/none", None),
                ],
            )
            .with(
                GarmentKind::Top,
                "polo",
                vec![
                    hit("Linen Shirt", "https://shop.example.com/linen", Some(&img("dup"))),
                    hit("Broken Polo", "https://shop.example.com/broken", Some(&img("broken"))),
                    hit("Polo", "https://shop.example.com/polo", Some(&img("polo"))),
                ],
            )
            .with(
                GarmentKind::Bottom,
                "chinos",
                vec![hit("Chinos", "https://shop.example.com/chinos", Some(&img("chinos")))],
            )
    }

    fn model() -> MockModel {
        MockModel {
            requirements: QueryRequirements {
                style: "smart casual".to_string(),
                ..QueryRequirements::default()
            },
            keywords: keywords(),
            pairing: Some(OutfitPairing {
                outfit_sets: vec![OutfitSet {
                    top_index: 1,
                    bottom_index: 0,
                    reasoning: "Polo and chinos".to_string(),
                }],
                overall_styling_tips: "Roll the sleeves.".to_string(),
            }),
            ..MockModel::default()
        }
    }

    fn stylist(model: Arc<MockModel>, search: MockSearch) -> Stylist {
        let fetcher = MockFetcher {
            broken: vec![img("broken")],
            ..MockFetcher::default()
        };
        Stylist::new(model, Arc::new(search), Arc::new(fetcher), StylistConfig::default())
    }

    fn request(query: &str) -> FindOutfitsRequest {
        FindOutfitsRequest {
            photo: Some(tagged_image("me")),
            profile: Some(UserProfile {
                gender: Gender::Male,
                body_shape: BodyShape::Athletic,
                skin_tone: SkinTone::Tan,
                current_style: None,
            }),
            query: query.to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_outfits_fills_session() {
        let model = Arc::new(model());
        let stylist = stylist(model.clone(), search());
        let mut session = StylistSession::default();

        let suggestions = stylist
            .find_outfits(&mut session, request("summer brunch outfit"))
            .await
            .unwrap();

        assert_eq!(suggestions.status, "Found 2 tops and 1 bottoms!");
        let titles: Vec<&str> = suggestions.tops.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Linen Shirt", "Polo"]);
        assert_eq!(suggestions.outfit_sets.len(), 1);
        assert_eq!(suggestions.requirements.style, "smart casual");

        assert_eq!(session.tops.len(), 2);
        assert_eq!(session.bottoms.len(), 1);
        assert_eq!(session.outfit_sets[0].top_index, 1);
        assert_eq!(session.profile.body_shape, BodyShape::Athletic);
        assert!(session.photo.is_some());

        assert_eq!(
            model.calls(),
            vec![
                "analyze_query:summer brunch outfit".to_string(),
                "keywords:athletic".to_string(),
                "pairing:2x1:3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_explanation_sections() {
        let model = Arc::new(model());
        let suggestions = stylist(model, search())
            .find_outfits(&mut StylistSession::default(), request("brunch"))
            .await
            .unwrap();

        assert_eq!(
            suggestions.explanation,
            "**For your athletic figure and tan skin tone:**\n\n\
             Relaxed fits suit a summer brunch.\n\n\
             **Recommended colors:** navy, white\n\n\
             **Styling tips:** Roll the sleeves."
        );
    }

    #[test]
    fn test_explanation_skips_empty_sections() {
        let profile = UserProfile::default();
        let explanation = build_explanation(
            &profile,
            &SearchKeywords::default(),
            &OutfitPairing::default(),
        );
        assert_eq!(explanation, "**For your average figure and medium skin tone:**\n\n");
    }

    #[tokio::test]
    async fn test_missing_photo_and_query() {
        let stylist = stylist(Arc::new(model()), search());
        let mut session = StylistSession::default();

        let mut no_photo = request("brunch");
        no_photo.photo = None;
        let err = stylist.find_outfits(&mut session, no_photo).await.unwrap_err();
        assert_eq!(err.user_friendly_message(), MISSING_PHOTO);

        let err = stylist
            .find_outfits(&mut session, request("   "))
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), MISSING_QUERY);
        assert!(session.photo.is_none());
    }

    #[tokio::test]
    async fn test_no_garments_keeps_previous_session() {
        let stylist = stylist(Arc::new(model()), MockSearch::default());
        let mut session = StylistSession {
            tops: vec![crate::core::testing::garment("Old", "https://shop.example.com/old")],
            ..StylistSession::default()
        };

        let err = stylist
            .find_outfits(&mut session, request("brunch"))
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), NO_GARMENTS);
        assert_eq!(session.tops.len(), 1);
    }

    #[tokio::test]
    async fn test_tops_only_skips_pairing() {
        let model = Arc::new(model());
        let search = MockSearch::default().with(
            GarmentKind::Top,
            "linen shirt",
            vec![hit("Linen Shirt", "https://shop.example.com/linen", Some(&img("linen")))],
        );

        let suggestions = stylist(model.clone(), search)
            .find_outfits(&mut StylistSession::default(), request("brunch"))
            .await
            .unwrap();

        assert_eq!(suggestions.status, "Found 1 tops and 0 bottoms!");
        assert!(suggestions.outfit_sets.is_empty());
        assert!(!model.calls().iter().any(|c| c.starts_with("pairing")));
    }

    #[tokio::test]
    async fn test_auto_profile_uses_photo_analysis() {
        let model = Arc::new(MockModel {
            detected_profile: UserProfile {
                gender: Gender::Female,
                body_shape: BodyShape::Slim,
                skin_tone: SkinTone::Fair,
                current_style: Some("minimalist".to_string()),
            },
            ..model()
        });
        let mut req = request("office look");
        req.profile = None;

        let mut session = StylistSession::default();
        let suggestions = stylist(model.clone(), search())
            .find_outfits(&mut session, req)
            .await
            .unwrap();

        assert_eq!(suggestions.profile.body_shape, BodyShape::Slim);
        assert_eq!(session.profile.gender, Gender::Female);
        assert_eq!(model.calls()[0], "analyze_user_image:me");
    }

    #[tokio::test]
    async fn test_download_respects_limit() {
        let search = MockSearch::default().with(
            GarmentKind::Top,
            "linen shirt",
            (0..6)
                .map(|i| {
                    hit(
                        &format!("Shirt {}", i),
                        &format!("https://shop.example.com/{}", i),
                        Some(&img(&format!("shirt{}", i))),
                    )
                })
                .collect(),
        );
        let fetcher = Arc::new(MockFetcher::default());
        let stylist = Stylist::new(
            Arc::new(model()),
            Arc::new(search),
            fetcher.clone(),
            StylistConfig {
                max_tops: 2,
                ..StylistConfig::default()
            },
        );

        let suggestions = stylist
            .find_outfits(&mut StylistSession::default(), request("shirts"))
            .await
            .unwrap();

        assert_eq!(suggestions.tops.len(), 2);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
    }
}
