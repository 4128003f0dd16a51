//! Display protocol constants

/// Number of distinct stream ids before the id wraps around
pub const NUM_STREAMS: u32 = 50;

/// The only surface this channel ever creates
pub const PRIMARY_SURFACE_ID: u32 = 0;

/// Window size advertised when activating stream reports or metrics
pub const CLIENT_REPORT_WINDOW: u32 = 5;

/// Report timeout advertised when activating stream reports or metrics
pub const CLIENT_REPORT_TIMEOUT_MS: u32 = 1000;

/// Highest metric id understood by the server plus one
pub const METRIC_LAST: u32 = 10;

/// Unique id sent with report activations
pub const REPORT_UNIQUE_ID: u32 = 1;
