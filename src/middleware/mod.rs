pub mod auth;
pub mod json;
pub mod rate_limit;
pub mod response;
pub mod results;

pub use auth::{authenticate, authorize, COMMANDER_ONLY, PILOT_OR_COMMANDER};
pub use json::ApiJson;
pub use rate_limit::{rate_limit, ClientRateLimiter};
pub use response::{message, results_envelope, ApiResponse, ApiResult, Bare, TokenResponse};
pub use results::{advanced_results, ResultsLayer, ResultsSpec};
