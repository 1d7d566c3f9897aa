//! Procurement competitions (concursos)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

text_enum! {
    pub enum TipoConcurso {
        LicitacionPublica => "LICITACION_PUBLICA",
        InvitacionRestringida => "INVITACION_RESTRINGIDA",
        AdjudicacionDirecta => "ADJUDICACION_DIRECTA",
    }
}

text_enum! {
    pub enum EstatusConcurso {
        Borrador => "BORRADOR",
        Publicado => "PUBLICADO",
        EnEvaluacion => "EN_EVALUACION",
        Adjudicado => "ADJUDICADO",
        Desierto => "DESIERTO",
        Cancelado => "CANCELADO",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransicionError {
    #[error("No se puede cambiar un concurso de {desde} a {hacia}")]
    NoPermitida {
        desde: EstatusConcurso,
        hacia: EstatusConcurso,
    },

    #[error("Para adjudicar un concurso se requiere el proveedor ganador")]
    SinGanador,
}

impl EstatusConcurso {
    pub fn es_terminal(&self) -> bool {
        matches!(self, Self::Adjudicado | Self::Desierto | Self::Cancelado)
    }

    pub fn puede_transicionar_a(&self, nuevo: EstatusConcurso) -> bool {
        use EstatusConcurso::*;
        matches!(
            (self, nuevo),
            (Borrador, Publicado)
                | (Borrador, Cancelado)
                | (Publicado, EnEvaluacion)
                | (Publicado, Cancelado)
                | (EnEvaluacion, Adjudicado)
                | (EnEvaluacion, Desierto)
                | (EnEvaluacion, Cancelado)
        )
    }
}

/// Validate a status change. Awarding requires the winning supplier.
pub fn validar_transicion(
    actual: EstatusConcurso,
    nuevo: EstatusConcurso,
    id_proveedor_ganador: Option<i32>,
) -> Result<(), TransicionError> {
    if !actual.puede_transicionar_a(nuevo) {
        return Err(TransicionError::NoPermitida {
            desde: actual,
            hacia: nuevo,
        });
    }
    if nuevo == EstatusConcurso::Adjudicado && id_proveedor_ganador.is_none() {
        return Err(TransicionError::SinGanador);
    }
    Ok(())
}

/// Competition record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concurso {
    pub id_concurso: i32,
    pub numero_concurso: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub tipo_concurso: TipoConcurso,
    pub id_secretaria: i32,
    pub id_solicitud: Option<i32>,
    pub estatus: EstatusConcurso,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub fecha_limite_propuestas: Option<DateTime<Utc>>,
    pub fecha_fallo: Option<DateTime<Utc>>,
    pub monto_estimado: Option<Decimal>,
    pub id_proveedor_ganador: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrearConcursoRequest {
    pub numero_concurso: String,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub tipo_concurso: TipoConcurso,
    pub id_secretaria: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_solicitud: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_limite_propuestas: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto_estimado: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActualizarConcursoRequest {
    pub id_concurso: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_limite_propuestas: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto_estimado: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambioEstatusConcursoRequest {
    pub id_concurso: i32,
    pub estatus: EstatusConcurso,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_proveedor_ganador: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConcursosQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_concurso: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estatus: Option<EstatusConcurso>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_secretaria: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcursoIdQuery {
    pub id_concurso: i32,
}

#[cfg(test)]
mod tests {
    use super::EstatusConcurso::*;
    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert!(validar_transicion(Borrador, Publicado, None).is_ok());
        assert!(validar_transicion(Publicado, EnEvaluacion, None).is_ok());
        assert!(validar_transicion(EnEvaluacion, Adjudicado, Some(4)).is_ok());
        assert!(validar_transicion(EnEvaluacion, Desierto, None).is_ok());
    }

    #[test]
    fn terminal_states_do_not_move() {
        for terminal in [Adjudicado, Desierto, Cancelado] {
            assert!(terminal.es_terminal());
            for destino in EstatusConcurso::ALL {
                assert!(!terminal.puede_transicionar_a(*destino));
            }
        }
    }

    #[test]
    fn skipping_steps_is_rejected() {
        let err = validar_transicion(Borrador, Adjudicado, Some(1)).unwrap_err();
        assert_eq!(
            err,
            TransicionError::NoPermitida {
                desde: Borrador,
                hacia: Adjudicado
            }
        );
        assert!(err.to_string().contains("BORRADOR"));
    }

    #[test]
    fn awarding_requires_winner() {
        assert_eq!(
            validar_transicion(EnEvaluacion, Adjudicado, None),
            Err(TransicionError::SinGanador)
        );
    }
}
