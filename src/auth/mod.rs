pub mod session;

use crate::db::models::User;
use crate::error::{AppError, AppResult};

use self::session::SessionManager;

/// Gate for operations that need an identity: the active user, or
/// `Unauthorized` with nothing touched.
pub fn require_user(session: &SessionManager) -> AppResult<&User> {
    session.current().ok_or(AppError::Unauthorized)
}

/// Gate for delete/edit: the acting user must own the record.
pub fn ensure_owner(user: &User, owner_id: &str) -> AppResult<()> {
    if user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
