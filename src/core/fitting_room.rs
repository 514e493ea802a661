use crate::core::session::StylistSession;
use crate::core::stylist::MISSING_PHOTO;
use crate::domain::model::{
    Garment, GarmentCategory, GarmentKind, ImageData, PhotoType, TryOnOutcome,
};
use crate::domain::ports::{StylistModel, TryOnRenderer};
use crate::utils::error::{Result, StylistError};
use std::sync::Arc;
use std::time::Instant;

pub const NO_GARMENTS_YET: &str = "Please search for outfits first!";
pub const INVALID_GARMENT: &str = "Invalid garment selection!";
pub const NO_OUTFIT_SETS: &str = "No outfit sets available!";
pub const INVALID_SET: &str = "Invalid outfit set selection!";
pub const INVALID_SET_INDICES: &str = "Invalid outfit set indices!";

/// Renders garments from a session onto the session's photo.
pub struct FittingRoom {
    model: Arc<dyn StylistModel>,
    renderer: Arc<dyn TryOnRenderer>,
}

impl FittingRoom {
    pub fn new(model: Arc<dyn StylistModel>, renderer: Arc<dyn TryOnRenderer>) -> Self {
        Self { model, renderer }
    }

    pub async fn try_on_garment(
        &self,
        session: &StylistSession,
        kind: GarmentKind,
        index: usize,
    ) -> Result<TryOnOutcome> {
        let person = require_photo(session)?;
        let garments = session.garments(kind);
        if garments.is_empty() {
            return Err(StylistError::invalid_input(NO_GARMENTS_YET));
        }
        let garment = garments
            .get(index)
            .ok_or_else(|| StylistError::invalid_input(INVALID_GARMENT))?;

        tracing::info!("👕 Trying on {} {}: {}", kind, index, garment.hit.title);
        let image = self.render_garment(person, garment, kind).await?;

        Ok(TryOnOutcome {
            image,
            status: format!(
                "Try-on complete! Showing: {}",
                title_or(garment, "Selected garment")
            ),
            buy_url: buy_url(garment),
        })
    }

    /// Puts the set's top on the photo, then the bottom on that result.
    pub async fn try_on_full_set(
        &self,
        session: &StylistSession,
        set_index: usize,
    ) -> Result<TryOnOutcome> {
        let person = require_photo(session)?;
        if session.outfit_sets.is_empty() {
            return Err(StylistError::invalid_input(NO_OUTFIT_SETS));
        }
        let set = session
            .outfit_sets
            .get(set_index)
            .ok_or_else(|| StylistError::invalid_input(INVALID_SET))?;
        let (Some(top), Some(bottom)) = (
            session.garment(GarmentKind::Top, set.top_index),
            session.garment(GarmentKind::Bottom, set.bottom_index),
        ) else {
            return Err(StylistError::invalid_input(INVALID_SET_INDICES));
        };

        let started = Instant::now();
        tracing::info!("👕 Trying on top for set {}", set_index);
        let with_top = self.render_garment(person, top, GarmentKind::Top).await?;
        tracing::info!("👖 Trying on bottom over the top result for set {}", set_index);
        let image = self
            .render_garment(&with_top, bottom, GarmentKind::Bottom)
            .await?;
        tracing::info!(
            "✅ Full set {} rendered in {:.2}s",
            set_index,
            started.elapsed().as_secs_f64()
        );

        Ok(TryOnOutcome {
            image,
            status: format!(
                "Full set try-on complete! {} + {}",
                title_or(top, "Top"),
                title_or(bottom, "Bottom")
            ),
            buy_url: buy_url(top).or_else(|| buy_url(bottom)),
        })
    }

    /// Try-on for an arbitrary garment image. Without a category the model
    /// classifies the garment first.
    pub async fn try_on_image(
        &self,
        person: &ImageData,
        garment: &ImageData,
        category: Option<GarmentCategory>,
    ) -> Result<ImageData> {
        let classification = self.model.classify_garment(garment).await;
        tracing::debug!("Garment classified as {:?}", classification);
        let category = category.unwrap_or(classification.category);
        self.renderer
            .render(person, garment, category, classification.photo_type)
            .await
    }

    async fn render_garment(
        &self,
        person: &ImageData,
        garment: &Garment,
        kind: GarmentKind,
    ) -> Result<ImageData> {
        let photo_type: PhotoType = self.model.classify_garment(&garment.image).await.photo_type;
        self.renderer
            .render(person, &garment.image, kind.category(), photo_type)
            .await
    }
}

fn require_photo(session: &StylistSession) -> Result<&ImageData> {
    session
        .photo
        .as_ref()
        .ok_or_else(|| StylistError::invalid_input(MISSING_PHOTO))
}

fn title_or<'a>(garment: &'a Garment, fallback: &'a str) -> &'a str {
    if garment.hit.title.is_empty() {
        fallback
    } else {
        &garment.hit.title
    }
}

fn buy_url(garment: &Garment) -> Option<String> {
    Some(garment.hit.url.clone()).filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{garment, tag_of, tagged_image, MockModel, MockRenderer};
    use crate::domain::model::{GarmentClassification, OutfitSet};

    fn session() -> StylistSession {
        StylistSession {
            photo: Some(tagged_image("me")),
            tops: vec![
                garment("tee", "https://shop.example.com/tee"),
                garment("blazer", ""),
            ],
            bottoms: vec![garment("jeans", "https://shop.example.com/jeans")],
            outfit_sets: vec![
                OutfitSet {
                    top_index: 1,
                    bottom_index: 0,
                    reasoning: "Sharp".to_string(),
                },
                OutfitSet {
                    top_index: 0,
                    bottom_index: 5,
                    reasoning: "Broken".to_string(),
                },
            ],
            ..StylistSession::default()
        }
    }

    fn room(renderer: Arc<MockRenderer>) -> FittingRoom {
        let model = MockModel {
            classification: GarmentClassification {
                category: GarmentCategory::Bottoms,
                photo_type: PhotoType::FlatLay,
                description: "denim".to_string(),
            },
            ..MockModel::default()
        };
        FittingRoom::new(Arc::new(model), renderer)
    }

    #[tokio::test]
    async fn test_try_on_garment() {
        let renderer = Arc::new(MockRenderer::default());
        let outcome = room(renderer.clone())
            .try_on_garment(&session(), GarmentKind::Top, 0)
            .await
            .unwrap();

        assert_eq!(tag_of(&outcome.image), "me+tee");
        assert_eq!(outcome.status, "Try-on complete! Showing: tee");
        assert_eq!(outcome.buy_url.as_deref(), Some("https://shop.example.com/tee"));

        // Category follows the garment kind, photo type comes from the model.
        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls[0], ("tee".to_string(), GarmentCategory::Tops, PhotoType::FlatLay));
    }

    #[tokio::test]
    async fn test_try_on_garment_without_page_has_no_buy_link() {
        let outcome = room(Arc::new(MockRenderer::default()))
            .try_on_garment(&session(), GarmentKind::Top, 1)
            .await
            .unwrap();
        assert!(outcome.buy_url.is_none());
    }

    #[tokio::test]
    async fn test_try_on_garment_rejections() {
        let room = room(Arc::new(MockRenderer::default()));

        let no_photo = StylistSession {
            photo: None,
            ..session()
        };
        let err = room
            .try_on_garment(&no_photo, GarmentKind::Top, 0)
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), MISSING_PHOTO);

        let empty = StylistSession {
            photo: Some(tagged_image("me")),
            ..StylistSession::default()
        };
        let err = room
            .try_on_garment(&empty, GarmentKind::Bottom, 0)
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), NO_GARMENTS_YET);

        let err = room
            .try_on_garment(&session(), GarmentKind::Bottom, 1)
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), INVALID_GARMENT);
    }

    #[tokio::test]
    async fn test_full_set_chains_top_then_bottom() {
        let renderer = Arc::new(MockRenderer::default());
        let outcome = room(renderer.clone())
            .try_on_full_set(&session(), 0)
            .await
            .unwrap();

        assert_eq!(tag_of(&outcome.image), "me+blazer+jeans");
        assert_eq!(outcome.status, "Full set try-on complete! blazer + jeans");
        assert_eq!(outcome.buy_url.as_deref(), Some("https://shop.example.com/jeans"));

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls[0].1, GarmentCategory::Tops);
        assert_eq!(calls[1].1, GarmentCategory::Bottoms);
    }

    #[tokio::test]
    async fn test_full_set_rejections() {
        let room = room(Arc::new(MockRenderer::default()));

        let no_sets = StylistSession {
            outfit_sets: Vec::new(),
            ..session()
        };
        let err = room.try_on_full_set(&no_sets, 0).await.unwrap_err();
        assert_eq!(err.user_friendly_message(), NO_OUTFIT_SETS);

        let err = room.try_on_full_set(&session(), 2).await.unwrap_err();
        assert_eq!(err.user_friendly_message(), INVALID_SET);

        let err = room.try_on_full_set(&session(), 1).await.unwrap_err();
        assert_eq!(err.user_friendly_message(), INVALID_SET_INDICES);
    }

    #[tokio::test]
    async fn test_renderer_failure_propagates() {
        let renderer = Arc::new(MockRenderer {
            fail_with: Some("pose not detected".to_string()),
            ..MockRenderer::default()
        });
        let err = room(renderer)
            .try_on_garment(&session(), GarmentKind::Top, 0)
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), "Error in try-on: pose not detected");
    }

    #[tokio::test]
    async fn test_try_on_image_classifies_when_category_unknown() {
        let renderer = Arc::new(MockRenderer::default());
        let room = room(renderer.clone());

        room.try_on_image(&tagged_image("me"), &tagged_image("skirt"), None)
            .await
            .unwrap();
        room.try_on_image(
            &tagged_image("me"),
            &tagged_image("dress"),
            Some(GarmentCategory::OnePieces),
        )
        .await
        .unwrap();

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls[0].1, GarmentCategory::Bottoms);
        assert_eq!(calls[1].1, GarmentCategory::OnePieces);
        assert_eq!(calls[1].2, PhotoType::FlatLay);
    }
}
