pub mod providers;
mod router;
mod sources;

pub use router::SourceRouter;
pub use sources::{PriceSource, QuoteError};
