// Analysis result document written by the traffic analyzer
pub const RESULT_FILE_NAME: &str = "analysis_result.json";

// Uploaded junction videos land here
pub const VIDEOS_DIR: &str = "Videos";
pub const ALLOWED_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

// Junction keys used in the analysis document
pub const JUNCTION1_KEY: &str = "junction1";
pub const JUNCTION2_KEY: &str = "junction2";

// Result polling
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

// Signal cycle tick
pub const TICK_INTERVAL_MS: u64 = 1000;

// Timings used when no analysis result could be obtained
pub const FALLBACK_GREEN_SECONDS: u32 = 30;
pub const FALLBACK_YELLOW_SECONDS: u32 = 5;
pub const FALLBACK_DENSITY: f64 = 0.0;

// Timing derivation from densities
pub const BASE_GREEN_SECONDS: u32 = 30;
pub const PROPORTIONAL_GREEN_BUDGET: f64 = 45.0;
pub const MIN_GREEN_SECONDS: u32 = 15;
pub const MAX_GREEN_SECONDS: u32 = 60;
pub const STANDARD_YELLOW_SECONDS: u32 = 3;
