pub mod csv_source;
pub mod logging;
pub mod persistence;

pub use csv_source::{SeasonsByPlayer, load_contracts, load_seasons};
pub use persistence::{ArtifactStore, DatasetStore};
