pub mod loaders;
pub mod search;
pub mod storage;

pub use loaders::*;
pub use search::*;
pub use storage::*;
