mod asset;

pub use asset::{Asset, SourceType, UnknownSourceType};
