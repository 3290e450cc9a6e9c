// storage/mod.rs
pub mod video_store;

pub use video_store::{DirectoryVideoStore, VideoStore};
