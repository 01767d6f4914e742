pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::ReturnHorizon;
pub use error::{CoreError, FetchError};
pub use structs::{PricePoint, PriceSeries, Symbol};
