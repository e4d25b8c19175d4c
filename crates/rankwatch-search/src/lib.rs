pub mod client;
pub mod error;
pub mod pacer;
pub mod types;

pub use client::{SearchClient, ShoppingSearchClient};
pub use error::{FailureClass, SearchError};
pub use pacer::RequestPacer;
pub use types::{SearchItem, SearchPage};
