pub mod accounts;
pub mod email;
pub mod incidents;
pub mod missions;
pub mod reports;
pub mod storage;
pub mod users;

pub use accounts::AccountService;
pub use email::{EmailError, EmailSender, OutgoingEmail, SmtpEmailSender};
pub use incidents::IncidentService;
pub use missions::MissionService;
pub use reports::ReportService;
pub use storage::{HttpObjectStore, LocalObjectStore, ObjectStore, StorageError};
pub use users::UserService;

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::database::models::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
