pub mod domain;
pub mod infrastructure;

pub use domain::{
    AnimePartial, AnimeRecord, AnimeStatus, AnimeType, CatalogStore, DownloadLinks,
    EpisodePartial, EpisodeRecord, EpisodeStub, StreamingLinks,
};
pub use infrastructure::CatalogStoreImpl;
