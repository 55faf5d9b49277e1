pub mod artifacts;
pub mod evaluate;
pub mod ranking;
pub mod rollout;
pub mod traces;
pub mod video;
pub mod visualize;

pub use artifacts::*;
pub use evaluate::*;
pub use ranking::*;
pub use rollout::*;
pub use traces::*;
pub use video::*;
pub use visualize::*;
