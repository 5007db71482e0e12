pub mod dataset;
pub mod errors;
pub mod estimator;
pub mod metric;
pub mod params;
pub mod record;

pub use dataset::*;
pub use errors::*;
pub use estimator::*;
pub use metric::*;
pub use params::*;
pub use record::*;
