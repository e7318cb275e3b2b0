pub mod playlist_sync;
pub mod theme_repository;

pub use playlist_sync::{PlaylistSnapshot, PlaylistSync, PlaylistTrack, SyncError};
pub use theme_repository::{RepoError, ThemeRepository};
