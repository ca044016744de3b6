pub mod graph;
pub mod summary;

pub use graph::{GraphCommand, GraphFlags};
pub use summary::SummaryCommand;
