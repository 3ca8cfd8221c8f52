#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Live job monitoring for codeagent
//!
//! [`JobTracker`] is the pure state machine that folds progress events into
//! a status and an append-only log. [`JobSubscription`] drives a tracker from
//! the backend's event stream on a background task and can be closed at any
//! moment, after which nothing mutates its state again.

mod subscription;
mod tracker;

pub use subscription::{JobSnapshot, JobSubscription, StreamState};
pub use tracker::{
    JobLog, JobTracker, TrackerUpdate, CANCELED_LINE, COMPLETED_LINE, CONNECTION_LOST_LINE,
    EXPIRED_LINE, SEED_LINE,
};
