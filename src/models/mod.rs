pub mod analytics;
pub mod report;
pub mod series;
pub mod tables;

pub use analytics::*;
pub use report::*;
pub use series::*;
pub use tables::*;
