//! Constants used throughout the pipeline

/// Number of body landmarks in the BODY_25 layout
pub const NUM_JOINTS: usize = 25;

/// Scalar columns per frame (x and y for every joint)
pub const NUM_COORDINATES: usize = NUM_JOINTS * 2;

/// Values per keypoint in a pose record (x, y, confidence)
pub const VALUES_PER_KEYPOINT: usize = 3;

/// Minimum length of a `pose_keypoints_2d` array
pub const KEYPOINT_RECORD_LEN: usize = NUM_JOINTS * VALUES_PER_KEYPOINT;

/// Rows per gait segment
pub const DEFAULT_SEGMENT_LENGTH: usize = 30;

/// Segments taken per view
pub const DEFAULT_SEGMENT_COUNT: usize = 4;

/// Offsets are placed at `rows * i / DEFAULT_OFFSET_DIVISOR`
pub const DEFAULT_OFFSET_DIVISOR: usize = 5;

/// Allowed change in missing-cell count between imputation passes
pub const DEFAULT_IMPUTATION_TOLERANCE: usize = 5;

/// Upper bound on imputation passes
pub const DEFAULT_MAX_IMPUTATION_PASSES: usize = 100;

/// Round-robin rounds of the multivariate fallback
pub const DEFAULT_FALLBACK_MAX_ITER: usize = 10;

/// Relative convergence threshold of the multivariate fallback
pub const DEFAULT_FALLBACK_TOL: f64 = 1e-3;

/// Score above which a clip is labelled positive
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Columns in a fused table (four front + four side)
pub const FUSED_COLUMNS: usize = 8;

/// Length of the flattened feature vector for a full cycle
pub const DEFAULT_FEATURE_LENGTH: usize = DEFAULT_SEGMENT_LENGTH * DEFAULT_SEGMENT_COUNT * FUSED_COLUMNS;

/// Raw angle reported for degenerate geometry (straight limb)
pub const STRAIGHT_ANGLE_DEG: f64 = 180.0;

/// Pixel coordinate marking a joint that was never set
pub const UNSET_COORDINATE: f64 = -1.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
