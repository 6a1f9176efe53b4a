/// HTTP access to the gallery and generation services
///
/// - `client.rs` - the `ApiClient` every async task goes through
/// - `types.rs` - JSON wire types

pub mod client;
pub mod types;

pub use client::{ApiClient, FetchedImage};
pub use types::{GenerationModel, ImageMetadata};
