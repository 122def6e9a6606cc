pub mod normalize;
pub mod confidence; // Reviewer-facing field confidence
