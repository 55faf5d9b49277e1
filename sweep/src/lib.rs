mod backend;
mod launch;
mod options;
mod variant;

pub use backend::*;
pub use launch::*;
pub use options::*;
pub use variant::*;
