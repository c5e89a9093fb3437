pub mod lines;
pub mod scan;

pub use scan::scan;
