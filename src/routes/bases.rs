//! Bases (bidding terms) routes
//!
//! One bases document per concurso. Every edit bumps `version`; once
//! published the document is frozen.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{columna, conflicto_si_duplicado};
use super::concursos::buscar_concurso;
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{RequireAuth, Rol};
use crate::domain::bases::{
    ActualizarBasesRequest, Bases, BasesIdQuery, CrearBasesRequest, EstatusBases,
};
use crate::domain::concursos::{ConcursoIdQuery, EstatusConcurso};
use crate::error::ApiError;

const BASES_COLUMNS: &str = r#"
    id_bases, id_concurso, objeto, requisitos_participacion, criterios_evaluacion,
    fecha_junta_aclaraciones, fecha_apertura, lugar_entrega, costo_bases,
    version, estatus, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct BasesRow {
    id_bases: i32,
    id_concurso: i32,
    objeto: String,
    requisitos_participacion: String,
    criterios_evaluacion: String,
    fecha_junta_aclaraciones: Option<DateTime<Utc>>,
    fecha_apertura: Option<DateTime<Utc>>,
    lugar_entrega: Option<String>,
    costo_bases: Option<Decimal>,
    version: i32,
    estatus: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BasesRow> for Bases {
    type Error = ApiError;

    fn try_from(row: BasesRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_bases: row.id_bases,
            id_concurso: row.id_concurso,
            objeto: row.objeto,
            requisitos_participacion: row.requisitos_participacion,
            criterios_evaluacion: row.criterios_evaluacion,
            fecha_junta_aclaraciones: row.fecha_junta_aclaraciones,
            fecha_apertura: row.fecha_apertura,
            lugar_entrega: row.lugar_entrega,
            costo_bases: row.costo_bases,
            version: row.version,
            estatus: columna(&row.estatus)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

async fn buscar_bases(db: &sqlx::PgPool, id_bases: i32) -> Result<Bases, ApiError> {
    let sql = format!("SELECT {BASES_COLUMNS} FROM bases WHERE id_bases = $1");
    sqlx::query_as::<_, BasesRow>(&sql)
        .bind(id_bases)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Bases no encontradas"))?
        .try_into()
}

/// GET /api/bases?id_concurso=
pub async fn obtener_bases(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConcursoIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let sql = format!("SELECT {BASES_COLUMNS} FROM bases WHERE id_concurso = $1");
    let bases: Bases = sqlx::query_as::<_, BasesRow>(&sql)
        .bind(query.id_concurso)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("El concurso no tiene bases"))?
        .try_into()?;

    // Drafts are internal
    if auth.rol == Rol::Proveedor && bases.estatus != EstatusBases::Publicadas {
        return Err(ApiError::not_found("El concurso no tiene bases"));
    }

    Ok(Json(DataResponse::new(bases)))
}

/// POST /api/bases
pub async fn crear_bases(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CrearBasesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;
    req.validar().map_err(ApiError::bad_request)?;

    let concurso = buscar_concurso(&state.db, req.id_concurso).await?;
    if concurso.estatus != EstatusConcurso::Borrador {
        return Err(ApiError::conflict(format!(
            "Las bases solo pueden crearse para concursos en BORRADOR (estatus actual: {})",
            concurso.estatus
        )));
    }

    let sql = format!(
        r#"
        INSERT INTO bases (
            id_concurso, objeto, requisitos_participacion, criterios_evaluacion,
            fecha_junta_aclaraciones, fecha_apertura, lugar_entrega, costo_bases
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {BASES_COLUMNS}
        "#
    );
    let bases: Bases = sqlx::query_as::<_, BasesRow>(&sql)
        .bind(req.id_concurso)
        .bind(req.objeto.trim())
        .bind(req.requisitos_participacion.trim())
        .bind(req.criterios_evaluacion.trim())
        .bind(req.fecha_junta_aclaraciones)
        .bind(req.fecha_apertura)
        .bind(&req.lugar_entrega)
        .bind(req.costo_bases)
        .fetch_one(&state.db)
        .await
        .map_err(|e| conflicto_si_duplicado(e, "El concurso ya tiene bases"))?
        .try_into()?;

    tracing::info!(
        user_id = auth.user_id,
        id_concurso = bases.id_concurso,
        id_bases = bases.id_bases,
        "Bases created"
    );

    Ok(Created(bases))
}

/// PUT /api/bases
pub async fn actualizar_bases(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ActualizarBasesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let mut bases = buscar_bases(&state.db, req.id_bases).await?;
    if bases.estatus == EstatusBases::Publicadas {
        return Err(ApiError::conflict(
            "Las bases ya fueron publicadas y no pueden modificarse",
        ));
    }
    bases.aplicar(req).map_err(ApiError::bad_request)?;

    // `version` in the WHERE clause rejects a concurrent edit
    let sql = format!(
        r#"
        UPDATE bases SET
            objeto = $3,
            requisitos_participacion = $4,
            criterios_evaluacion = $5,
            fecha_junta_aclaraciones = $6,
            fecha_apertura = $7,
            lugar_entrega = $8,
            costo_bases = $9,
            version = version + 1,
            updated_at = NOW()
        WHERE id_bases = $1 AND version = $2 AND estatus = 'BORRADOR'
        RETURNING {BASES_COLUMNS}
        "#
    );
    let actualizadas: Bases = sqlx::query_as::<_, BasesRow>(&sql)
        .bind(bases.id_bases)
        .bind(bases.version)
        .bind(&bases.objeto)
        .bind(&bases.requisitos_participacion)
        .bind(&bases.criterios_evaluacion)
        .bind(bases.fecha_junta_aclaraciones)
        .bind(bases.fecha_apertura)
        .bind(&bases.lugar_entrega)
        .bind(bases.costo_bases)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::conflict("Las bases fueron modificadas por otro usuario; recargue e intente de nuevo")
        })?
        .try_into()?;

    tracing::info!(
        user_id = auth.user_id,
        id_bases = actualizadas.id_bases,
        version = actualizadas.version,
        "Bases updated"
    );

    Ok(Json(DataResponse::new(actualizadas)))
}

/// PATCH /api/bases
///
/// Publishes the bases. Publishing twice is a conflict.
pub async fn publicar_bases(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<BasesIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let sql = format!(
        r#"
        UPDATE bases SET estatus = 'PUBLICADAS', updated_at = NOW()
        WHERE id_bases = $1 AND estatus = 'BORRADOR'
        RETURNING {BASES_COLUMNS}
        "#
    );
    let publicadas = sqlx::query_as::<_, BasesRow>(&sql)
        .bind(req.id_bases)
        .fetch_optional(&state.db)
        .await?;

    let bases: Bases = match publicadas {
        Some(row) => row.try_into()?,
        None => {
            // Tell "missing" apart from "already published"
            let existente = buscar_bases(&state.db, req.id_bases).await?;
            return Err(ApiError::conflict(format!(
                "Las bases ya están en estatus {}",
                existente.estatus
            )));
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        id_bases = bases.id_bases,
        id_concurso = bases.id_concurso,
        "Bases published"
    );

    Ok(Json(DataResponse::new(bases)))
}
