use crate::utils::error::{Result, StylistError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyShape {
    Slim,
    Average,
    Athletic,
    PlusSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinTone {
    Fair,
    Medium,
    Tan,
    Dark,
}

/// Lowercases and collapses spaces/underscores to dashes so that model output
/// like `"Plus Size"` matches `plus-size`.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl Gender {
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "male" | "man" | "men" => Some(Self::Male),
            "female" | "woman" | "women" => Some(Self::Female),
            "other" | "neutral" | "non-binary" | "unisex" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl BodyShape {
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "slim" | "thin" | "petite" => Some(Self::Slim),
            "average" | "medium" | "regular" => Some(Self::Average),
            "athletic" | "muscular" => Some(Self::Athletic),
            "plus-size" | "plus" | "plussize" | "curvy" => Some(Self::PlusSize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slim => "slim",
            Self::Average => "average",
            Self::Athletic => "athletic",
            Self::PlusSize => "plus-size",
        }
    }
}

impl SkinTone {
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "fair" | "light" | "pale" => Some(Self::Fair),
            "medium" | "olive" => Some(Self::Medium),
            "tan" | "tanned" => Some(Self::Tan),
            "dark" | "deep" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fair => "fair",
            Self::Medium => "medium",
            Self::Tan => "tan",
            Self::Dark => "dark",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Gender, BodyShape, SkinTone, GarmentKind, GarmentCategory, PhotoType);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub gender: Gender,
    pub body_shape: BodyShape,
    pub skin_tone: SkinTone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_style: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Other,
            body_shape: BodyShape::Average,
            skin_tone: SkinTone::Medium,
            current_style: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequirements {
    pub style: String,
    pub occasion: String,
    pub weather: String,
    pub items: Vec<String>,
    pub colors: Vec<String>,
    pub budget: String,
}

impl Default for QueryRequirements {
    fn default() -> Self {
        Self {
            style: "casual".to_string(),
            occasion: "daily".to_string(),
            weather: "not specified".to_string(),
            items: Vec::new(),
            colors: Vec::new(),
            budget: "not specified".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchKeywords {
    pub tops_keywords: Vec<String>,
    pub bottoms_keywords: Vec<String>,
    pub recommended_colors: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentKind {
    Top,
    Bottom,
}

impl GarmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "top" | "tops" => Some(Self::Top),
            "bottom" | "bottoms" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// Category sent to the try-on service for this kind of garment.
    pub fn category(&self) -> GarmentCategory {
        match self {
            Self::Top => GarmentCategory::Tops,
            Self::Bottom => GarmentCategory::Bottoms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
}

impl SearchHit {
    /// Identity used when merging results of several keyword searches.
    pub fn dedup_key(&self) -> Option<&str> {
        if !self.url.is_empty() {
            return Some(&self.url);
        }
        self.image_url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageData {
    /// Builds an image from raw bytes, taking the MIME type from the magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        match infer::get(&bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(Self {
                mime: kind.mime_type().to_string(),
                bytes,
            }),
            Some(kind) => Err(StylistError::image(format!(
                "expected an image, got {}",
                kind.mime_type()
            ))),
            None => Err(StylistError::image("unrecognized image format")),
        }
    }

    /// Accepts either a `data:image/...;base64,` URL or bare base64.
    pub fn from_data_url(input: &str) -> Result<Self> {
        let payload = match input.trim().strip_prefix("data:") {
            Some(rest) => {
                let (meta, data) = rest
                    .split_once(',')
                    .ok_or_else(|| StylistError::image("malformed data URL"))?;
                if !meta.ends_with(";base64") {
                    return Err(StylistError::image("data URL must be base64 encoded"));
                }
                data
            }
            None => input.trim(),
        };

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| StylistError::image(format!("invalid base64: {}", e)))?;
        Self::from_bytes(bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }

    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Garment {
    pub hit: SearchHit,
    pub image: ImageData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GarmentCategory {
    #[serde(rename = "tops")]
    Tops,
    #[serde(rename = "bottoms")]
    Bottoms,
    #[serde(rename = "one-pieces")]
    OnePieces,
}

impl GarmentCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "tops" | "top" => Some(Self::Tops),
            "bottoms" | "bottom" => Some(Self::Bottoms),
            "one-pieces" | "one-piece" | "onepiece" => Some(Self::OnePieces),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tops => "tops",
            Self::Bottoms => "bottoms",
            Self::OnePieces => "one-pieces",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoType {
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "flat-lay")]
    FlatLay,
}

impl PhotoType {
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "model" => Some(Self::Model),
            "flat-lay" | "flatlay" => Some(Self::FlatLay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::FlatLay => "flat-lay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentClassification {
    pub category: GarmentCategory,
    pub photo_type: PhotoType,
    pub description: String,
}

impl Default for GarmentClassification {
    fn default() -> Self {
        Self {
            category: GarmentCategory::Tops,
            photo_type: PhotoType::Model,
            description: "Unable to classify garment".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitSet {
    pub top_index: usize,
    pub bottom_index: usize,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutfitPairing {
    pub outfit_sets: Vec<OutfitSet>,
    pub overall_styling_tips: String,
}

/// Public view of one suggested garment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentSummary {
    pub index: usize,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
}

impl GarmentSummary {
    pub fn from_garment(index: usize, garment: &Garment) -> Self {
        Self {
            index,
            title: garment.hit.title.clone(),
            url: garment.hit.url.clone(),
            image_url: garment.hit.image_url.clone(),
            price: garment.hit.price.clone(),
        }
    }
}

/// Result of a find-outfits run.
#[derive(Debug, Clone, Serialize)]
pub struct OutfitSuggestions {
    pub profile: UserProfile,
    pub requirements: QueryRequirements,
    pub keywords: SearchKeywords,
    pub tops: Vec<GarmentSummary>,
    pub bottoms: Vec<GarmentSummary>,
    pub outfit_sets: Vec<OutfitSet>,
    pub explanation: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct TryOnOutcome {
    pub image: ImageData,
    pub status: String,
    pub buy_url: Option<String>,
}
