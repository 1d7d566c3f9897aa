//! Contracts generated from awarded concursos

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::concursos::EstatusConcurso;
use super::proveedores::EstatusRevision;

text_enum! {
    pub enum EstatusContrato {
        Borrador => "BORRADOR",
        EnviadoFirma => "ENVIADO_FIRMA",
        Firmado => "FIRMADO",
        Cancelado => "CANCELADO",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContratoError {
    #[error("El concurso debe estar ADJUDICADO para generar un contrato (estatus actual: {0})")]
    ConcursoNoAdjudicado(EstatusConcurso),

    #[error("El proveedor {0} no es el ganador registrado del concurso")]
    ProveedorNoGanador(i32),

    #[error("El proveedor debe estar APROBADO para contratar (estatus actual: {0})")]
    ProveedorNoAprobado(EstatusRevision),

    #[error("La fecha de fin no puede ser anterior a la fecha de inicio")]
    VigenciaInvalida,

    #[error("El monto total del contrato debe ser mayor a cero")]
    MontoInvalido,

    #[error("El contrato en estatus {0} ya no puede modificarse")]
    NoEditable(EstatusContrato),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contrato {
    pub id_contrato: i32,
    pub id_concurso: i32,
    pub id_proveedor: i32,
    pub numero_contrato: String,
    pub objeto: String,
    pub monto_total: Decimal,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub estatus: EstatusContrato,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerarContratoRequest {
    pub id_concurso: i32,
    pub id_proveedor: i32,
    pub monto_total: Decimal,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    /// Defaults to the objeto of the concurso's bases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objeto: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActualizarContratoRequest {
    pub id_contrato: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objeto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monto_total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estatus: Option<EstatusContrato>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContratosQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_contrato: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_concurso: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<i32>,
}

/// What contract generation needs to know about the concurso and the supplier.
#[derive(Debug, Clone, Copy)]
pub struct ContextoGeneracion {
    pub estatus_concurso: EstatusConcurso,
    pub id_proveedor_ganador: Option<i32>,
    pub estatus_proveedor: EstatusRevision,
}

/// Check every precondition for generating a contract.
pub fn validar_generacion(
    ctx: &ContextoGeneracion,
    req: &GenerarContratoRequest,
) -> Result<(), ContratoError> {
    if ctx.estatus_concurso != EstatusConcurso::Adjudicado {
        return Err(ContratoError::ConcursoNoAdjudicado(ctx.estatus_concurso));
    }
    if ctx.id_proveedor_ganador != Some(req.id_proveedor) {
        return Err(ContratoError::ProveedorNoGanador(req.id_proveedor));
    }
    if ctx.estatus_proveedor != EstatusRevision::Aprobado {
        return Err(ContratoError::ProveedorNoAprobado(ctx.estatus_proveedor));
    }
    validar_vigencia_y_monto(req.fecha_inicio, req.fecha_fin, req.monto_total)
}

pub fn validar_vigencia_y_monto(
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    monto_total: Decimal,
) -> Result<(), ContratoError> {
    if fecha_fin < fecha_inicio {
        return Err(ContratoError::VigenciaInvalida);
    }
    if monto_total <= Decimal::ZERO {
        return Err(ContratoError::MontoInvalido);
    }
    Ok(())
}

/// `CT-{año}-{id_concurso:04}-{consecutivo:03}`; `existentes` is how many
/// contracts the concurso already has.
pub fn numero_contrato(anio: i32, id_concurso: i32, existentes: i64) -> String {
    format!("CT-{anio}-{id_concurso:04}-{:03}", existentes + 1)
}

impl EstatusContrato {
    /// Only drafts accept edits to their terms.
    pub fn es_editable(&self) -> bool {
        matches!(self, Self::Borrador)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id_proveedor: i32) -> GenerarContratoRequest {
        GenerarContratoRequest {
            id_concurso: 12,
            id_proveedor,
            monto_total: Decimal::new(150_000_00, 2),
            fecha_inicio: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            fecha_fin: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            objeto: None,
        }
    }

    fn ctx() -> ContextoGeneracion {
        ContextoGeneracion {
            estatus_concurso: EstatusConcurso::Adjudicado,
            id_proveedor_ganador: Some(5),
            estatus_proveedor: EstatusRevision::Aprobado,
        }
    }

    #[test]
    fn numbering_is_zero_padded() {
        assert_eq!(numero_contrato(2026, 12, 0), "CT-2026-0012-001");
        assert_eq!(numero_contrato(2026, 12345, 9), "CT-2026-12345-010");
    }

    #[test]
    fn generation_accepts_awarded_winner() {
        assert_eq!(validar_generacion(&ctx(), &req(5)), Ok(()));
    }

    #[test]
    fn generation_preconditions() {
        let mut c = ctx();
        c.estatus_concurso = EstatusConcurso::EnEvaluacion;
        assert_eq!(
            validar_generacion(&c, &req(5)),
            Err(ContratoError::ConcursoNoAdjudicado(EstatusConcurso::EnEvaluacion))
        );

        assert_eq!(
            validar_generacion(&ctx(), &req(6)),
            Err(ContratoError::ProveedorNoGanador(6))
        );

        let mut c = ctx();
        c.estatus_proveedor = EstatusRevision::EnRevision;
        assert_eq!(
            validar_generacion(&c, &req(5)),
            Err(ContratoError::ProveedorNoAprobado(EstatusRevision::EnRevision))
        );

        let mut r = req(5);
        r.fecha_fin = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(validar_generacion(&ctx(), &r), Err(ContratoError::VigenciaInvalida));

        let mut r = req(5);
        r.monto_total = Decimal::ZERO;
        assert_eq!(validar_generacion(&ctx(), &r), Err(ContratoError::MontoInvalido));
    }
}
