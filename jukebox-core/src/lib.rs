pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod media;
pub mod player;
pub mod playlist;
pub mod progress;
pub mod source;
pub mod song;
pub mod timer;

pub use config::{PlayerConfig, PlaylistSource};
pub use error::PlaylistError;
pub use events::PlayerEvent;
pub use media::{MediaEvent, MediaHandle};
pub use player::Player;
pub use progress::{PlaybackStatus, format_time};
pub use song::{Song, SongId};
