//! HTTP control surface for the ticket desk.
//!
//! The chat event bridge forwards button presses, commands and message
//! activity here; everything else lives in `ticketdesk-core`.

pub mod api;
pub mod metrics;
pub mod state;
