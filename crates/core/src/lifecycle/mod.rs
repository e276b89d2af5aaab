//! Ticket lifecycle: creation, close and archive, membership, activity
//! tracking and the inactivity sweeper.

mod manager;
pub mod naming;
mod sweeper;
mod types;

pub use manager::TicketManager;
pub use sweeper::{InactivitySweeper, SweepReport, SweeperSettings};
pub use types::{
    CloseRequest, CloseTrigger, ClosedTicket, CreatedTicket, IdleCondition, LifecycleSettings,
    TicketError, UserRef,
};
