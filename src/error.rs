use thiserror::Error;

use crate::model::NodeId;

/// Errors surfaced by the chart engine and its file helpers.
#[derive(Debug, Error)]
pub enum GanttError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown timeline unit '{0}'")]
    UnknownSight(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("no task node {0:?}")]
    NoSuchNode(NodeId),

    /// The bar is waiting on a persistence result and cannot be dragged.
    #[error("task node {0:?} has an update in flight")]
    BarBusy(NodeId),

    #[error("no drag session is active")]
    NoActiveDrag,
}

pub type Result<T> = std::result::Result<T, GanttError>;
