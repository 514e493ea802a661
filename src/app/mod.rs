pub mod export;

use crate::adapters::fashn::FashnClient;
use crate::adapters::gemini::GeminiClient;
use crate::adapters::images::{prepare_image, HttpImageFetcher};
use crate::adapters::tavily::TavilyClient;
use crate::config::{AppConfig, ImageConfig};
use crate::core::{FittingRoom, Stylist};
use crate::domain::model::ImageData;
use crate::domain::ports::{GarmentSearch, ImageFetcher, StylistModel, TryOnRenderer};
use crate::utils::error::Result;
use std::sync::Arc;

/// The two halves of the flow wired to the same providers.
pub struct StylistApp {
    pub stylist: Stylist,
    pub fitting_room: FittingRoom,
    images: ImageConfig,
}

impl StylistApp {
    pub fn new(
        model: Arc<dyn StylistModel>,
        search: Arc<dyn GarmentSearch>,
        fetcher: Arc<dyn ImageFetcher>,
        renderer: Arc<dyn TryOnRenderer>,
        config: &AppConfig,
    ) -> Self {
        Self {
            stylist: Stylist::new(model.clone(), search, fetcher, config.stylist.clone()),
            fitting_room: FittingRoom::new(model, renderer),
            images: config.images.clone(),
        }
    }

    /// Applies the same size bounds to an uploaded photo as to downloaded garments.
    pub fn prepare_photo(&self, photo: ImageData) -> Result<ImageData> {
        prepare_image(photo, &self.images)
    }

    /// Builds the Gemini, Tavily and FASHN clients. Fails with a missing
    /// configuration error when any API key is absent.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(&config.images)?);
        let model = Arc::new(GeminiClient::new(&config.gemini)?);
        let search = Arc::new(TavilyClient::new(&config.tavily)?);
        let renderer = Arc::new(FashnClient::new(&config.vto, fetcher.clone())?);

        tracing::info!(
            "🧵 Providers ready: gemini model={}, try-on model={}",
            config.gemini.model,
            config.vto.model_name
        );
        Ok(Self::new(model, search, fetcher, renderer, config))
    }
}
