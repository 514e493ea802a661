use crate::domain::model::{Garment, GarmentKind, ImageData, OutfitSet, UserProfile};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// State carried between a search and the try-ons that follow it.
#[derive(Debug, Clone, Default)]
pub struct StylistSession {
    pub photo: Option<ImageData>,
    pub profile: UserProfile,
    pub tops: Vec<Garment>,
    pub bottoms: Vec<Garment>,
    pub outfit_sets: Vec<OutfitSet>,
}

impl StylistSession {
    pub fn garments(&self, kind: GarmentKind) -> &[Garment] {
        match kind {
            GarmentKind::Top => &self.tops,
            GarmentKind::Bottom => &self.bottoms,
        }
    }

    pub fn garment(&self, kind: GarmentKind, index: usize) -> Option<&Garment> {
        self.garments(kind).get(index)
    }
}

pub type SharedSession = Arc<Mutex<StylistSession>>;

struct Entry {
    session: SharedSession,
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// In-memory sessions keyed by random ids, bounded by evicting the least
/// recently used session.
pub struct SessionStore {
    inner: Mutex<Inner>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                clock: 0,
            }),
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn create(&self) -> (String, SharedSession) {
        let id = uuid::Uuid::new_v4().to_string();
        let session: SharedSession = Arc::new(Mutex::new(StylistSession::default()));

        let mut inner = self.inner.lock().await;
        while inner.entries.len() >= self.max_sessions {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(oldest) => {
                    tracing::debug!("Evicting session {}", oldest);
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        let last_used = inner.tick();
        inner.entries.insert(
            id.clone(),
            Entry {
                session: session.clone(),
                last_used,
            },
        );
        (id, session)
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let mut inner = self.inner.lock().await;
        let now = inner.tick();
        let entry = inner.entries.get_mut(id)?;
        entry.last_used = now;
        Some(entry.session.clone())
    }

    /// Existing session for `id`, or a fresh one when the id is unknown or absent.
    pub async fn get_or_create(&self, id: Option<&str>) -> (String, SharedSession) {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return (id.to_string(), session);
            }
        }
        self.create().await
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}
