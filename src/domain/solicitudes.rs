//! Purchase requests (solicitudes) raised by a secretaría

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum EstatusSolicitud {
        Pendiente => "PENDIENTE",
        Aprobada => "APROBADA",
        Rechazada => "RECHAZADA",
        EnConcurso => "EN_CONCURSO",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Solicitud {
    pub id_solicitud: i32,
    pub id_secretaria: i32,
    pub id_usuario_solicitante: i32,
    pub descripcion: String,
    pub justificacion: Option<String>,
    pub monto_estimado: Option<Decimal>,
    pub estatus: EstatusSolicitud,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrearSolicitudRequest {
    pub id_secretaria: i32,
    pub descripcion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justificacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto_estimado: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambioEstatusSolicitudRequest {
    pub id_solicitud: i32,
    pub estatus: EstatusSolicitud,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolicitudesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_secretaria: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estatus: Option<EstatusSolicitud>,
}

impl EstatusSolicitud {
    /// Requests only move forward out of `PENDIENTE`; an approved request may go to concurso.
    pub fn puede_transicionar_a(&self, nuevo: EstatusSolicitud) -> bool {
        use EstatusSolicitud::*;
        matches!(
            (self, nuevo),
            (Pendiente, Aprobada) | (Pendiente, Rechazada) | (Aprobada, EnConcurso)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::EstatusSolicitud::*;

    #[test]
    fn solicitud_transitions() {
        assert!(Pendiente.puede_transicionar_a(Aprobada));
        assert!(Pendiente.puede_transicionar_a(Rechazada));
        assert!(Aprobada.puede_transicionar_a(EnConcurso));
        assert!(!Pendiente.puede_transicionar_a(EnConcurso));
        assert!(!Rechazada.puede_transicionar_a(Aprobada));
    }
}
