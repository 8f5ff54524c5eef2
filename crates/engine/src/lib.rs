//! UI-agnostic core of the pet site's interactive page.
//!
//! Components own their transient state and never touch the DOM: the host
//! turns page events into engine events and performs the actions returned.

pub mod config;
pub mod error;
pub mod filmstrip;
pub mod hotspots;
pub mod player;
pub mod playlist;
pub mod recovery;
pub mod scrubber;
pub mod sections;
pub mod time;

pub use config::SiteConfig;
pub use error::{EngineError, Result};
pub use filmstrip::{FilmstripAction, FilmstripGenerator, FilmstripPhase, SurfaceSize};
pub use hotspots::{HotspotAnnotator, PanelChange};
pub use player::{HeroPlayer, MediaSnapshot, PlayerAction, PlayerEvent, ProbeEvent};
pub use playlist::{Playlist, PlaylistEntry};
pub use sections::{ArrowVisibility, ScrollDirection, SectionBounds, SectionNavigator};
