use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Identity of the caller as established by the authentication layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: i64,
    pub is_admin: bool,
}

impl ViewerContext {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn require_admin(&self, action: &str) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "administrator role required to {action}"
            )))
        }
    }
}
