use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::{AppSettingsError, ItemError};
use crate::pool::PoolError;
use crate::session::SessionError;

/// Any failure raised by the drill core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Settings(#[from] AppSettingsError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
