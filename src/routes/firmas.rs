//! Contract signature routes (`/api/firmaEnvia`)
//!
//! Sending a draft contract creates one firma per signer and moves the
//! contract to `ENVIADO_FIRMA`. Each answer re-derives the contract status
//! from the full set of firmas.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::columna;
use super::contratos::{buscar_contrato, exigir_acceso_contrato};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::contratos::{ContratoError, EstatusContrato};
use crate::domain::firmas::{
    estatus_contrato_por_firmas, EnviarFirmaRequest, EstatusFirma, Firma, FirmasQuery,
    RespuestaFirmaRequest,
};
use crate::error::ApiError;

const FIRMA_COLUMNS: &str =
    "id_firma, id_contrato, firmante_nombre, firmante_correo, estatus, enviada_en, firmada_en";

#[derive(Debug, sqlx::FromRow)]
struct FirmaRow {
    id_firma: i32,
    id_contrato: i32,
    firmante_nombre: String,
    firmante_correo: String,
    estatus: String,
    enviada_en: DateTime<Utc>,
    firmada_en: Option<DateTime<Utc>>,
}

impl TryFrom<FirmaRow> for Firma {
    type Error = ApiError;

    fn try_from(row: FirmaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_firma: row.id_firma,
            id_contrato: row.id_contrato,
            firmante_nombre: row.firmante_nombre,
            firmante_correo: row.firmante_correo,
            estatus: columna(&row.estatus)?,
            enviada_en: row.enviada_en,
            firmada_en: row.firmada_en,
        })
    }
}

/// GET /api/firmaEnvia?id_contrato=
pub async fn listar_firmas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FirmasQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let contrato = buscar_contrato(&state.db, query.id_contrato).await?;
    exigir_acceso_contrato(&auth, &contrato)?;

    let sql = format!("SELECT {FIRMA_COLUMNS} FROM firmas WHERE id_contrato = $1 ORDER BY id_firma");
    let firmas = sqlx::query_as::<_, FirmaRow>(&sql)
        .bind(query.id_contrato)
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(Firma::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(firmas)))
}

/// POST /api/firmaEnvia
///
/// Only draft contracts can be sent. Firmas from a previous, rejected round
/// are replaced.
pub async fn enviar_a_firma(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<EnviarFirmaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;
    req.validar().map_err(ApiError::bad_request)?;

    let mut tx = state.db.begin().await?;

    let estatus: String =
        sqlx::query_scalar("SELECT estatus FROM contratos WHERE id_contrato = $1 FOR UPDATE")
            .bind(req.id_contrato)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Contrato no encontrado"))?;
    let estatus: EstatusContrato = columna(&estatus)?;
    if !estatus.es_editable() {
        return Err(ContratoError::NoEditable(estatus).into());
    }

    sqlx::query("DELETE FROM firmas WHERE id_contrato = $1")
        .bind(req.id_contrato)
        .execute(&mut *tx)
        .await?;

    let sql = format!(
        r#"
        INSERT INTO firmas (id_contrato, firmante_nombre, firmante_correo)
        VALUES ($1, $2, $3)
        RETURNING {FIRMA_COLUMNS}
        "#
    );
    let mut firmas = Vec::with_capacity(req.firmantes.len());
    for firmante in &req.firmantes {
        let firma: Firma = sqlx::query_as::<_, FirmaRow>(&sql)
            .bind(req.id_contrato)
            .bind(firmante.nombre.trim())
            .bind(firmante.correo.trim())
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;
        firmas.push(firma);
    }

    sqlx::query("UPDATE contratos SET estatus = $2, updated_at = NOW() WHERE id_contrato = $1")
        .bind(req.id_contrato)
        .bind(EstatusContrato::EnviadoFirma.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        id_contrato = req.id_contrato,
        firmantes = firmas.len(),
        "Contract sent for signature"
    );

    Ok(Created(firmas))
}

/// PATCH /api/firmaEnvia
///
/// Record a signer's answer (`FIRMADA` or `RECHAZADA`).
pub async fn responder_firma(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<RespuestaFirmaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.estatus == EstatusFirma::Enviada {
        return Err(ApiError::bad_request(
            "La respuesta debe ser FIRMADA o RECHAZADA",
        ));
    }

    let mut tx = state.db.begin().await?;

    let (id_contrato, actual): (i32, String) =
        sqlx::query_as("SELECT id_contrato, estatus FROM firmas WHERE id_firma = $1 FOR UPDATE")
            .bind(req.id_firma)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Firma no encontrada"))?;

    let contrato = buscar_contrato(&mut *tx, id_contrato).await?;
    exigir_acceso_contrato(&auth, &contrato)?;

    let actual: EstatusFirma = columna(&actual)?;
    if actual != EstatusFirma::Enviada {
        return Err(ApiError::conflict(format!(
            "La firma ya fue respondida ({actual})"
        )));
    }
    if contrato.estatus != EstatusContrato::EnviadoFirma {
        return Err(ApiError::conflict(format!(
            "El contrato no está en firma (estatus actual: {})",
            contrato.estatus
        )));
    }

    let sql = format!(
        r#"
        UPDATE firmas
        SET estatus = $2, firmada_en = CASE WHEN $2 = 'FIRMADA' THEN NOW() ELSE NULL END
        WHERE id_firma = $1
        RETURNING {FIRMA_COLUMNS}
        "#
    );
    let firma: Firma = sqlx::query_as::<_, FirmaRow>(&sql)
        .bind(req.id_firma)
        .bind(req.estatus.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

    let estatus_firmas = sqlx::query_scalar::<_, String>(
        "SELECT estatus FROM firmas WHERE id_contrato = $1",
    )
    .bind(id_contrato)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|e| columna::<EstatusFirma>(e))
    .collect::<Result<Vec<_>, _>>()?;

    let nuevo = estatus_contrato_por_firmas(&estatus_firmas);
    sqlx::query("UPDATE contratos SET estatus = $2, updated_at = NOW() WHERE id_contrato = $1")
        .bind(id_contrato)
        .bind(nuevo.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        id_firma = firma.id_firma,
        id_contrato,
        respuesta = %firma.estatus,
        estatus_contrato = %nuevo,
        "Signature answer recorded"
    );

    Ok(Json(DataResponse::new(firma)))
}
