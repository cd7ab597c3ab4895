//! Landmark ownership: live anchors, world origin and queued requests

pub mod anchor_store;
pub mod pending;

pub use anchor_store::{
    AddOutcome, AnchorStore, FailedRequest, RecenterDecision, RecenterFailure, RecenterPolicy, RecenterReport,
    RecreationFailure, RemovalHook,
};
pub use pending::{LandmarkRequest, PendingQueue, RequestTicket};
