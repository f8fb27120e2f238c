//! Constants for the download module (timeouts, rate limiting, naming).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Warning threshold for cumulative rate limit delay per host (30 seconds).
pub const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After header value (1 hour).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Extension used when neither the URL nor the fixed name carries one.
pub const DEFAULT_ASSET_EXTENSION: &str = "jpg";

/// Suffix of in-progress downloads; never visible under the final name.
pub const PART_SUFFIX: &str = "part";
