//! Catalog provider implementations.

mod calibre;
mod giantbomb;
mod igdb;

pub use calibre::CalibreProvider;
pub use giantbomb::GiantBombProvider;
pub use igdb::IgdbProvider;
