mod build;
mod convex_hull;
mod sweep;
mod validate;

pub use build::BuildArrangement;
pub use convex_hull::ConvexHull;
pub use sweep::IntersectionSweep;
pub use validate::ValidateArrangement;
