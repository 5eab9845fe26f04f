use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("nothing to review")]
    NothingToReview,

    #[error("{0:?} is not in the wrong-word book")]
    WordNotFound(String),

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
