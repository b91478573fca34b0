//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the manager, the
//! scheduler dispatch loop, workers, and retry handlers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskManager`, `TaskHandler::exec`, `ObserverSet`
//!   workers (overflow/panic).
//! - **Consumers**: the manager's observer listener (fans out to
//!   [`ObserverSet`](crate::observers::ObserverSet)) and any receiver
//!   obtained from [`TaskManager::subscribe`](crate::TaskManager::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
