pub mod actions;
pub mod config;
pub mod diff;
pub mod export;
pub mod guard;
pub mod import;
pub mod rate_limit;

pub use actions::{Actor, LeadActions, StatusCount};
pub use config::ServiceConfig;
pub use diff::{compute_diff, initial_diff};
pub use guard::check_concurrency;
pub use rate_limit::{client_key, start_sweep_task, RateLimitExceeded, RateLimiter};
