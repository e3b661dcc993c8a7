//! Tracking and drawing parameters, shared by detection, refinement and the
//! flow estimator.

/// Maximum number of Shi-Tomasi corners detected per frame.
pub const MAX_CORNERS: i32 = 500;

/// Relative quality floor for accepted corners, against the strongest
/// response in the frame.
pub const QUALITY_LEVEL: f64 = 0.01;

/// Minimum spatial separation between accepted corners, in pixels.
pub const MIN_CORNER_DISTANCE: f64 = 5.0;

/// Neighborhood size for the corner response computation.
pub const DETECT_BLOCK_SIZE: i32 = 3;

/// Free parameter of the Harris detector. Unused while the Harris detector
/// stays off, carried as-is.
pub const HARRIS_K: f64 = 0.4;

/// Side length of the square search window used for sub-pixel refinement and
/// flow tracking, in pixels.
pub const WINDOW_SIZE: i32 = 10;

/// Pyramid depth requested from the flow estimator.
pub const PYRAMID_LEVELS: i32 = 5;

/// Iteration cap shared by sub-pixel refinement and flow estimation.
pub const TERM_MAX_ITER: i32 = 20;

/// Convergence threshold shared by sub-pixel refinement and flow estimation.
pub const TERM_EPSILON: f64 = 0.3;

/// Tracks whose estimation error exceeds this are dropped before drawing.
/// Empirical threshold, strictly greater-than exclusion.
pub const MAX_TRACK_ERROR: f32 = 550.0;

/// Codec of the output container.
pub const OUTPUT_FOURCC: [char; 4] = ['X', 'V', 'I', 'D'];

/// Output file written when the command line names none.
pub const DEFAULT_OUTPUT: &str = "output.avi";
