pub mod preprocessing;
pub mod extraction;
pub mod hierarchy;
pub mod moments;
pub mod ellipse;
pub mod features;

pub use preprocessing::*;
pub use extraction::*;
pub use hierarchy::*;
pub use moments::*;
pub use ellipse::*;
pub use features::*;
