/// Per-record analysis: share inspection and row projection.

pub mod projector;
pub mod shares;

pub use projector::project;
pub use shares::ShareInspector;
