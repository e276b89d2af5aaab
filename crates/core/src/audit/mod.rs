mod events;
mod file;
mod handle;
mod store;
mod writer;

pub use events::*;
pub use file::*;
pub use handle::*;
pub use store::*;
pub use writer::*;
