pub mod product_search;
pub mod unit_cache;

pub use product_search::{ProductLookup, ProductSearch, SearchOutcome, SearchState};
pub use unit_cache::{UnitMeasureCache, UnitMeasureFetcher, UnitMeasuresResult};
