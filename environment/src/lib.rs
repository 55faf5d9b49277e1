pub mod environment;
pub mod frame;
pub mod point_mass;
pub mod session;
pub mod space;
pub mod spec;

pub use crate::environment::*;
pub use crate::frame::*;
pub use crate::point_mass::*;
pub use crate::session::*;
pub use crate::space::*;
pub use crate::spec::*;
