pub mod exact;
pub mod predicates;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
///
/// Incidence decisions never use it; it is reserved for diagnostics and
/// approximate quantities such as face areas.
pub const TOLERANCE: f64 = 1e-10;
