//! Polling data synchronization.
//!
//! Every live card on the dashboard is the same thing underneath: a
//! [`Subscription`] polled by the [`scheduler`] into a cell that the card
//! reads.  This module is that one primitive; cards only choose the
//! endpoint, the decode function and the interval.
//!
//! ## For contributors
//!
//! * Never write to a cell from a view.  The scheduler task owns the
//!   [`cell::CellWriter`]; views get [`CellReader`]s.
//! * Keep the [`SchedulerHandle`] alive exactly as long as the view that
//!   reads the cell.  Dropping it cancels the subscription.
//! * User actions (set timer, toggle, capture) are not subscriptions; see
//!   [`crate::command`].

pub mod backoff;
pub mod cell;
pub mod scheduler;

pub use backoff::Backoff;
pub use cell::{CellReader, SyncSnapshot};
pub use scheduler::{start, SchedulerHandle, Subscription};
