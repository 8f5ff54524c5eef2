pub mod hero;
pub mod hotspots;
pub mod sections;
pub mod timeline;
