pub mod fitting_room;
pub mod json;
pub mod prompts;
pub mod session;
pub mod stylist;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{OutfitSuggestions, TryOnOutcome, UserProfile};
pub use crate::domain::ports::{GarmentSearch, ImageFetcher, StylistModel, TryOnRenderer};
pub use crate::utils::error::Result;
pub use fitting_room::FittingRoom;
pub use session::{SessionStore, SharedSession, StylistSession};
pub use stylist::{FindOutfitsRequest, Stylist};
