pub mod location;
pub mod reading;
pub mod report;

pub use location::*;
pub use reading::*;
pub use report::*;
