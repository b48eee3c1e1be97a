//! osstrends GitHub - remote search client
//!
//! Paginated user search by location, full profile and repository
//! language lookups, with uniform rate-limit classification.

pub mod api;
pub mod config;
pub mod error;
pub mod link;
pub mod rate_limit;
pub mod schema;

// Re-exports
pub use api::{GitHubClient, Transport};
pub use config::GitHubConfig;
pub use error::GithubError;
pub use rate_limit::RateLimitStatus;
