pub mod error;
pub mod options;
pub mod script;
pub mod segments;
pub mod normalize;
pub mod portals;
pub mod doors;
pub mod normals;
pub mod pool;
pub mod pack;
pub mod emit;
pub mod view;
pub mod compile;
pub mod verify;
pub mod artifacts;

pub use compile::{compile, CompiledLevel};
pub use error::CompileError;
pub use options::CompileOptions;
