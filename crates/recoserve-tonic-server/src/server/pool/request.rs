use recoserve_tonic_core::{
    Result,
    recoserve::{ItemId, Recommendations},
};
use std::collections::HashSet;
use tokio::sync::oneshot;

/// A unit of work sent to a worker task.
#[derive(Debug)]
pub enum WorkRequest {
    /// Rank products for one caller.
    Recommend {
        token: String,
        excluded: HashSet<ItemId>,
        response: oneshot::Sender<Result<Recommendations>>,
    },
    /// Stop the worker after acknowledging on `response`.
    Shutdown { response: oneshot::Sender<()> },
}
