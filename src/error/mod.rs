use crate::pdf::PdfError;
use crate::session::SessionError;
use crate::signature::store::StoreError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
