pub mod document;
pub mod event;
pub mod response;

pub use document::{Document, FieldKind, IngestRecord};
pub use event::SearchEvent;
pub use response::{
    AvailablePrefecture, CompanyGroup, MultiIndexStats, PrefectureStats, SearchResponse, Stats,
    UrlHit,
};
