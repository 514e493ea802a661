use super::{ApiError, AppState};
use crate::core::fitting_room::NO_GARMENTS_YET;
use crate::core::{FindOutfitsRequest, SharedSession};
use crate::domain::model::{
    BodyShape, Gender, GarmentKind, GarmentSummary, ImageData, OutfitSuggestions,
    QueryRequirements, SkinTone, TryOnOutcome, UserProfile,
};
use crate::utils::error::StylistError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("index.html");

type ApiResult<T> = std::result::Result<T, ApiError>;

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| StylistError::invalid_input(rejection.body_text()).into())
}

fn path_params<T>(path: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    path.map(|Path(value)| value)
        .map_err(|rejection| StylistError::invalid_input(rejection.body_text()).into())
}

#[derive(Debug, Deserialize)]
pub(super) struct OutfitsRequest {
    #[serde(default)]
    session_id: Option<String>,
    /// Data URL or bare base64. Falls back to the session's last photo.
    #[serde(default)]
    photo: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    body_shape: Option<String>,
    #[serde(default)]
    skin_tone: Option<String>,
    #[serde(default)]
    auto_profile: bool,
    #[serde(default)]
    current_style: Option<String>,
    #[serde(default)]
    query: String,
}

impl OutfitsRequest {
    fn profile(&self) -> Option<UserProfile> {
        if self.auto_profile {
            return None;
        }
        let defaults = UserProfile::default();
        Some(UserProfile {
            gender: self
                .gender
                .as_deref()
                .and_then(Gender::parse_lenient)
                .unwrap_or(defaults.gender),
            body_shape: self
                .body_shape
                .as_deref()
                .and_then(BodyShape::parse_lenient)
                .unwrap_or(defaults.body_shape),
            skin_tone: self
                .skin_tone
                .as_deref()
                .and_then(SkinTone::parse_lenient)
                .unwrap_or(defaults.skin_tone),
            current_style: self.current_style.clone().filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
struct GarmentView {
    #[serde(flatten)]
    summary: GarmentSummary,
    preview_url: String,
}

#[derive(Debug, Serialize)]
struct OutfitSetView {
    index: usize,
    top_index: usize,
    bottom_index: usize,
    top_title: String,
    bottom_title: String,
    reasoning: String,
}

#[derive(Debug, Serialize)]
struct OutfitsResponse {
    session_id: String,
    status: String,
    explanation: String,
    profile: UserProfile,
    requirements: QueryRequirements,
    tops: Vec<GarmentView>,
    bottoms: Vec<GarmentView>,
    outfit_sets: Vec<OutfitSetView>,
}

impl OutfitsResponse {
    fn new(session_id: String, suggestions: OutfitSuggestions) -> Self {
        let views = |kind: GarmentKind, summaries: &[GarmentSummary]| -> Vec<GarmentView> {
            summaries
                .iter()
                .map(|summary| GarmentView {
                    preview_url: format!(
                        "/api/sessions/{}/garments/{}/{}",
                        session_id, kind, summary.index
                    ),
                    summary: summary.clone(),
                })
                .collect()
        };
        let title = |summaries: &[GarmentSummary], index: usize| {
            summaries
                .get(index)
                .map(|s| s.title.clone())
                .unwrap_or_default()
        };

        let outfit_sets = suggestions
            .outfit_sets
            .iter()
            .enumerate()
            .map(|(index, set)| OutfitSetView {
                index,
                top_index: set.top_index,
                bottom_index: set.bottom_index,
                top_title: title(&suggestions.tops, set.top_index),
                bottom_title: title(&suggestions.bottoms, set.bottom_index),
                reasoning: set.reasoning.clone(),
            })
            .collect();

        Self {
            tops: views(GarmentKind::Top, &suggestions.tops),
            bottoms: views(GarmentKind::Bottom, &suggestions.bottoms),
            outfit_sets,
            status: suggestions.status,
            explanation: suggestions.explanation,
            profile: suggestions.profile,
            requirements: suggestions.requirements,
            session_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TryOnRequest {
    session_id: String,
    kind: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct TryOnSetRequest {
    session_id: String,
    set_index: usize,
}

#[derive(Debug, Serialize)]
struct TryOnResponse {
    image: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    buy_url: Option<String>,
}

impl From<TryOnOutcome> for TryOnResponse {
    fn from(outcome: TryOnOutcome) -> Self {
        Self {
            image: outcome.image.to_data_url(),
            status: outcome.status,
            buy_url: outcome.buy_url,
        }
    }
}

fn parse_kind(raw: &str) -> ApiResult<GarmentKind> {
    GarmentKind::parse(raw).ok_or_else(|| {
        StylistError::invalid_input(format!("Unknown garment kind '{}', use top or bottom", raw))
            .into()
    })
}

/// Try-ons need the session a search filled in; an unknown id means no search yet.
async fn searched_session(state: &AppState, id: &str) -> ApiResult<SharedSession> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| StylistError::invalid_input(NO_GARMENTS_YET).into())
}

/// GET /: the single-page UI
pub(super) async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api/health
pub(super) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// POST /api/outfits: analyze, search and pair
pub(super) async fn handle_find_outfits(
    State(state): State<AppState>,
    body: Result<Json<OutfitsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(body)?;
    let (session_id, session) = state
        .sessions
        .get_or_create(request.session_id.as_deref())
        .await;

    let mut session = session.lock().await;
    let photo = match request.photo.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            Some(state.app.prepare_photo(ImageData::from_data_url(raw)?)?)
        }
        _ => session.photo.clone(),
    };

    let suggestions = state
        .app
        .stylist
        .find_outfits(
            &mut session,
            FindOutfitsRequest {
                photo,
                profile: request.profile(),
                query: request.query.clone(),
            },
        )
        .await?;

    Ok(Json(OutfitsResponse::new(session_id, suggestions)))
}

/// GET /api/sessions/{id}/garments/{kind}/{index}: garment image bytes
pub(super) async fn handle_garment_image(
    State(state): State<AppState>,
    path: Result<Path<(String, String, usize)>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let (id, kind, index) = path_params(path)?;
    let kind = parse_kind(&kind)?;
    let session = state.sessions.get(&id).await.ok_or(StylistError::NotFound {
        what: format!("session {}", id),
    })?;

    let session = session.lock().await;
    let garment = session
        .garment(kind, index)
        .ok_or_else(|| StylistError::NotFound {
            what: format!("{} {}", kind, index),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, garment.image.mime.clone()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        garment.image.bytes.clone(),
    ))
}

/// POST /api/try-on: one garment on the session photo
pub(super) async fn handle_try_on(
    State(state): State<AppState>,
    body: Result<Json<TryOnRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(body)?;
    let kind = parse_kind(&request.kind)?;
    let session = searched_session(&state, &request.session_id).await?;

    // Rendering takes a while; work on a snapshot so previews stay available.
    let snapshot = session.lock().await.clone();
    let outcome = state
        .app
        .fitting_room
        .try_on_garment(&snapshot, kind, request.index)
        .await?;

    Ok(Json(TryOnResponse::from(outcome)))
}

/// POST /api/try-on/set: top then bottom of one suggested set
pub(super) async fn handle_try_on_set(
    State(state): State<AppState>,
    body: Result<Json<TryOnSetRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(body)?;
    let session = searched_session(&state, &request.session_id).await?;

    let snapshot = session.lock().await.clone();
    let outcome = state
        .app
        .fitting_room
        .try_on_full_set(&snapshot, request.set_index)
        .await?;

    Ok(Json(TryOnResponse::from(outcome)))
}
