//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] loja_core::EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already uses this email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Customer-facing message for form errors.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "E-mail inválido.".to_string(),
            Self::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            Self::UserAlreadyExists => {
                "Já existe uma conta com este e-mail. Faça login para continuar.".to_string()
            }
            Self::WeakPassword(msg) => msg.clone(),
            Self::Repository(RepositoryError::Conflict(field)) if field == "cpf" => {
                "Este CPF já está cadastrado.".to_string()
            }
            Self::Repository(_) | Self::PasswordHash => {
                "Não foi possível concluir agora. Tente novamente.".to_string()
            }
        }
    }

    /// Whether this is a server-side failure rather than bad input.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Repository(RepositoryError::Conflict(_)) => false,
            Self::Repository(_) | Self::PasswordHash => true,
            _ => false,
        }
    }
}
