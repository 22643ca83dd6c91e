mod mention_detector;
mod permission_calculator;

pub use mention_detector::MentionDetector;
pub use permission_calculator::PermissionCalculator;
