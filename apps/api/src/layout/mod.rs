// Length estimation: font metrics, the text-measurement seam, the line estimator,
// and the budget thresholds the controller steers by.
// CPU-bound estimation must run inside tokio::task::spawn_blocking.

pub mod budget;
pub mod estimator;
pub mod font_metrics;
pub mod handlers;

// Re-export the public API consumed by other modules (controller, pipeline, main).
pub use budget::{LengthBudget, LengthVerdict};
pub use estimator::{LengthEstimator, LineEstimator};
pub use font_metrics::{default_page_geometry, FontFamily};
