pub mod error;
pub mod http;
pub mod memory;
pub mod traits;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use memory::{InMemoryGateway, Operation, MIN_HISTORY_FOR_RECOMMENDATIONS};
pub use traits::CatalogGateway;
