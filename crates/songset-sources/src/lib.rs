//! HTTP clients for the catalog's upstream sources.
//!
//! - Spotify Web API: playlist names and tracks (client-credentials flow)
//! - YouTube Data API v3: most-viewed video lookup
//!
//! Both clients share the same retry policy, tracing spans and metrics.
//! The [`PlaylistSource`] and [`VideoSearch`] traits let pipeline steps run
//! against test doubles.

pub mod error;
mod http;
pub mod metrics;
pub mod retry;
pub mod spotify;
pub mod token;
pub mod youtube;

pub use error::{SourceError, SourceResult};
pub use retry::{with_retry, RetryConfig};
pub use spotify::{release_year, Playlist, PlaylistSource, SpotifyClient, SpotifyConfig};
pub use token::TokenCache;
pub use youtube::{pick_most_viewed, VideoSearch, YoutubeClient, YoutubeConfig, YoutubeMatch};
