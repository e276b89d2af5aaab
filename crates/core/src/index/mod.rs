//! Ticket index: the durable set of open tickets and the queue that
//! serializes every change to it.

mod error;
mod queue;
mod store;
mod types;

pub use error::{IndexError, MutationError};
pub use queue::{create_index_queue, IndexHandle, IndexWriter};
pub use store::{IndexStore, JsonIndexStore};
pub use types::TicketRecord;
