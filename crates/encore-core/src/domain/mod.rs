pub mod hall_pass;
pub mod ids;
pub mod phase;
pub mod song;
pub mod theme;
pub mod tier;

pub use hall_pass::{HallPass, HallPasses};
pub use ids::{SongId, ThemeId};
pub use phase::{Phase, PhaseThresholds, TierCounts};
pub use song::{PromotionRecord, Score, Song, SongRatings, StreamingLinks};
pub use theme::{InvariantViolation, PlaylistLink, Rejection, Theme, ThemeStatus, TieredSong};
pub use tier::Tier;
