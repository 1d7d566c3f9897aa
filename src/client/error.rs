use reqwest::StatusCode;
use thiserror::Error;

/// Every failure a portal call can surface. `Display` is always the message
/// meant for the user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-OK response. `message` comes from the body when it carries one.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("{contexto}: {source}")]
    Network {
        contexto: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{contexto}: respuesta inválida ({source})")]
    Decode {
        contexto: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Falta {0} en la sesión")]
    SessionMissing(&'static str),

    #[error("El proveedor {0} ya tiene un cambio de estatus en proceso")]
    RowBusy(i32),

    #[error("El proveedor {0} no está en la lista")]
    RowNotFound(i32),
}

impl ClientError {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source, .. } | Self::Decode { source, .. } => source.status(),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Ids are SERIAL keys, so anything below 1 is a caller bug.
pub(crate) fn exigir_id(nombre: &str, valor: i32) -> ClientResult<()> {
    if valor > 0 {
        Ok(())
    } else {
        Err(ClientError::InvalidArgument(format!(
            "{nombre} debe ser un entero positivo (recibido {valor})"
        )))
    }
}

pub(crate) fn exigir_texto(nombre: &str, valor: &str) -> ClientResult<()> {
    if valor.trim().is_empty() {
        Err(ClientError::InvalidArgument(format!("{nombre} es obligatorio")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_only_the_message() {
        let err = ClientError::Api {
            status: StatusCode::CONFLICT,
            message: "El concurso ya tiene bases".to_string(),
        };
        assert_eq!(err.to_string(), "El concurso ya tiene bases");
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(exigir_id("id_proveedor", 1).is_ok());
        let err = exigir_id("id_proveedor", 0).unwrap_err();
        assert!(err.to_string().contains("id_proveedor"));
        assert!(exigir_id("id_proveedor", -4).is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(exigir_texto("rfc", "ABC010101AB1").is_ok());
        assert!(matches!(
            exigir_texto("rfc", "   "),
            Err(ClientError::InvalidArgument(_))
        ));
    }
}
