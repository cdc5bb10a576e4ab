pub mod anime;
pub mod episode;
pub mod repository;

pub use anime::{AnimePartial, AnimeRecord, AnimeStatus, AnimeType};
pub use episode::{
    normalize_stubs, DownloadLinks, EpisodePartial, EpisodeRecord, EpisodeStub, SourceUrlField,
    StreamingLinks,
};
pub use repository::CatalogStore;
