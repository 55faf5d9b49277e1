pub mod fixed_skill;
pub mod linear_gaussian;
pub mod policy;
pub mod snapshot;

pub use crate::fixed_skill::*;
pub use crate::linear_gaussian::*;
pub use crate::policy::*;
pub use crate::snapshot::*;
