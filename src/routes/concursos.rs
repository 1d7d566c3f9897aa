//! Concurso (procurement competition) routes
//!
//! Status changes follow the concurso transition table. Suppliers only ever
//! see concursos that left `BORRADOR`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{columna, conflicto_si_duplicado};
use crate::api::{Created, DataResponse, MessageResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{RequireAuth, Rol};
use crate::domain::concursos::{
    validar_transicion, ActualizarConcursoRequest, CambioEstatusConcursoRequest, Concurso,
    ConcursoIdQuery, ConcursosQuery, CrearConcursoRequest, EstatusConcurso,
};
use crate::domain::proveedores::EstatusRevision;
use crate::domain::solicitudes::EstatusSolicitud;
use crate::error::ApiError;

pub(crate) const CONCURSO_COLUMNS: &str = r#"
    id_concurso, numero_concurso, nombre, descripcion, tipo_concurso,
    id_secretaria, id_solicitud, estatus, fecha_publicacion,
    fecha_limite_propuestas, fecha_fallo, monto_estimado,
    id_proveedor_ganador, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ConcursoRow {
    id_concurso: i32,
    numero_concurso: String,
    nombre: String,
    descripcion: Option<String>,
    tipo_concurso: String,
    id_secretaria: i32,
    id_solicitud: Option<i32>,
    estatus: String,
    fecha_publicacion: Option<DateTime<Utc>>,
    fecha_limite_propuestas: Option<DateTime<Utc>>,
    fecha_fallo: Option<DateTime<Utc>>,
    monto_estimado: Option<Decimal>,
    id_proveedor_ganador: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConcursoRow> for Concurso {
    type Error = ApiError;

    fn try_from(row: ConcursoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_concurso: row.id_concurso,
            numero_concurso: row.numero_concurso,
            nombre: row.nombre,
            descripcion: row.descripcion,
            tipo_concurso: columna(&row.tipo_concurso)?,
            id_secretaria: row.id_secretaria,
            id_solicitud: row.id_solicitud,
            estatus: columna(&row.estatus)?,
            fecha_publicacion: row.fecha_publicacion,
            fecha_limite_propuestas: row.fecha_limite_propuestas,
            fecha_fallo: row.fecha_fallo,
            monto_estimado: row.monto_estimado,
            id_proveedor_ganador: row.id_proveedor_ganador,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) async fn buscar_concurso<'e, E>(db: E, id_concurso: i32) -> Result<Concurso, ApiError>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = format!("SELECT {CONCURSO_COLUMNS} FROM concursos WHERE id_concurso = $1");
    sqlx::query_as::<_, ConcursoRow>(&sql)
        .bind(id_concurso)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Concurso no encontrado"))?
        .try_into()
}

/// GET /api/concursos
///
/// `?id_concurso=` returns one record; otherwise a paginated list filtered by
/// `estatus` and `id_secretaria`.
pub async fn obtener_concursos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConcursosQuery>,
    auth: RequireAuth,
) -> Result<Response, ApiError> {
    let es_proveedor = auth.rol == Rol::Proveedor;

    if let Some(id_concurso) = query.id_concurso {
        let concurso = buscar_concurso(&state.db, id_concurso).await?;
        if es_proveedor && concurso.estatus == EstatusConcurso::Borrador {
            return Err(ApiError::not_found("Concurso no encontrado"));
        }
        return Ok(Json(DataResponse::new(concurso)).into_response());
    }

    let pagination = PaginationParams::new(query.page, query.per_page);
    let estatus = query.estatus.map(|e| e.as_str());

    const FILTROS: &str = r#"
        WHERE ($1::text IS NULL OR estatus = $1)
          AND ($2::int IS NULL OR id_secretaria = $2)
          AND (NOT $3 OR estatus <> 'BORRADOR')
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM concursos {FILTROS}"))
        .bind(estatus)
        .bind(query.id_secretaria)
        .bind(es_proveedor)
        .fetch_one(&state.db)
        .await?;

    let sql = format!(
        "SELECT {CONCURSO_COLUMNS} FROM concursos {FILTROS} ORDER BY created_at DESC, id_concurso DESC LIMIT $4 OFFSET $5"
    );
    let concursos = sqlx::query_as::<_, ConcursoRow>(&sql)
        .bind(estatus)
        .bind(query.id_secretaria)
        .bind(es_proveedor)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(Concurso::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(concursos, &pagination, total.max(0) as u64).into_response())
}

/// POST /api/concursos
///
/// A concurso raised from an approved solicitud moves it to `EN_CONCURSO`.
pub async fn crear_concurso(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CrearConcursoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    if req.numero_concurso.trim().is_empty() || req.nombre.trim().is_empty() {
        return Err(ApiError::bad_request(
            "El número y el nombre del concurso son obligatorios",
        ));
    }
    if req.monto_estimado.is_some_and(|m| m.is_sign_negative()) {
        return Err(ApiError::bad_request("El monto estimado no puede ser negativo"));
    }

    let mut tx = state.db.begin().await?;

    if let Some(id_solicitud) = req.id_solicitud {
        let estatus: String =
            sqlx::query_scalar("SELECT estatus FROM solicitudes WHERE id_solicitud = $1 FOR UPDATE")
                .bind(id_solicitud)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::not_found("Solicitud no encontrada"))?;
        let estatus: EstatusSolicitud = columna(&estatus)?;
        if !estatus.puede_transicionar_a(EstatusSolicitud::EnConcurso) {
            return Err(ApiError::conflict(format!(
                "La solicitud debe estar APROBADA para iniciar un concurso (estatus actual: {estatus})"
            )));
        }

        sqlx::query("UPDATE solicitudes SET estatus = $2, updated_at = NOW() WHERE id_solicitud = $1")
            .bind(id_solicitud)
            .bind(EstatusSolicitud::EnConcurso.as_str())
            .execute(&mut *tx)
            .await?;
    }

    let sql = format!(
        r#"
        INSERT INTO concursos (
            numero_concurso, nombre, descripcion, tipo_concurso, id_secretaria,
            id_solicitud, fecha_limite_propuestas, monto_estimado
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {CONCURSO_COLUMNS}
        "#
    );
    let concurso: Concurso = sqlx::query_as::<_, ConcursoRow>(&sql)
        .bind(req.numero_concurso.trim())
        .bind(req.nombre.trim())
        .bind(&req.descripcion)
        .bind(req.tipo_concurso.as_str())
        .bind(req.id_secretaria)
        .bind(req.id_solicitud)
        .bind(req.fecha_limite_propuestas)
        .bind(req.monto_estimado)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflicto_si_duplicado(e, "Ya existe un concurso con ese número"))?
        .try_into()?;

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        id_concurso = concurso.id_concurso,
        numero = %concurso.numero_concurso,
        "Concurso created"
    );

    Ok(Created(concurso))
}

/// PUT /api/concursos
pub async fn actualizar_concurso(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ActualizarConcursoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let actual = buscar_concurso(&state.db, req.id_concurso).await?;
    if actual.estatus.es_terminal() {
        return Err(ApiError::conflict(format!(
            "El concurso en estatus {} ya no puede modificarse",
            actual.estatus
        )));
    }
    if req.nombre.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::bad_request("El nombre del concurso no puede quedar vacío"));
    }

    let sql = format!(
        r#"
        UPDATE concursos SET
            nombre = COALESCE($2, nombre),
            descripcion = COALESCE($3, descripcion),
            fecha_limite_propuestas = COALESCE($4, fecha_limite_propuestas),
            monto_estimado = COALESCE($5, monto_estimado),
            updated_at = NOW()
        WHERE id_concurso = $1
        RETURNING {CONCURSO_COLUMNS}
        "#
    );
    let concurso: Concurso = sqlx::query_as::<_, ConcursoRow>(&sql)
        .bind(req.id_concurso)
        .bind(&req.nombre)
        .bind(&req.descripcion)
        .bind(req.fecha_limite_propuestas)
        .bind(req.monto_estimado)
        .fetch_one(&state.db)
        .await?
        .try_into()?;

    Ok(Json(DataResponse::new(concurso)))
}

/// PATCH /api/concursos
///
/// Publishing needs published bases. Awarding needs an approved winner.
pub async fn cambiar_estatus_concurso(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CambioEstatusConcursoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let mut tx = state.db.begin().await?;

    let actual: String =
        sqlx::query_scalar("SELECT estatus FROM concursos WHERE id_concurso = $1 FOR UPDATE")
            .bind(req.id_concurso)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Concurso no encontrado"))?;
    let actual: EstatusConcurso = columna(&actual)?;

    validar_transicion(actual, req.estatus, req.id_proveedor_ganador)?;

    match req.estatus {
        EstatusConcurso::Publicado => {
            let publicadas: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM bases WHERE id_concurso = $1 AND estatus = 'PUBLICADAS')",
            )
            .bind(req.id_concurso)
            .fetch_one(&mut *tx)
            .await?;
            if !publicadas {
                return Err(ApiError::conflict(
                    "El concurso no puede publicarse sin bases publicadas",
                ));
            }
        }
        EstatusConcurso::Adjudicado => {
            let id_ganador = req.id_proveedor_ganador.unwrap_or_default();
            let estatus: String = sqlx::query_scalar(
                "SELECT estatus_revision FROM proveedores WHERE id_proveedor = $1",
            )
            .bind(id_ganador)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Proveedor ganador no encontrado"))?;
            let estatus: EstatusRevision = columna(&estatus)?;
            if estatus != EstatusRevision::Aprobado {
                return Err(ApiError::conflict(format!(
                    "El proveedor ganador debe estar APROBADO (estatus actual: {estatus})"
                )));
            }
        }
        _ => {}
    }

    let sql = format!(
        r#"
        UPDATE concursos SET
            estatus = $2,
            id_proveedor_ganador = CASE WHEN $2 = 'ADJUDICADO' THEN $3 ELSE id_proveedor_ganador END,
            fecha_publicacion = CASE WHEN $2 = 'PUBLICADO' THEN NOW() ELSE fecha_publicacion END,
            fecha_fallo = CASE WHEN $2 IN ('ADJUDICADO', 'DESIERTO') THEN NOW() ELSE fecha_fallo END,
            updated_at = NOW()
        WHERE id_concurso = $1
        RETURNING {CONCURSO_COLUMNS}
        "#
    );
    let concurso: Concurso = sqlx::query_as::<_, ConcursoRow>(&sql)
        .bind(req.id_concurso)
        .bind(req.estatus.as_str())
        .bind(req.id_proveedor_ganador)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        id_concurso = concurso.id_concurso,
        anterior = %actual,
        nuevo = %concurso.estatus,
        ganador = ?concurso.id_proveedor_ganador,
        "Concurso status changed"
    );

    Ok(Json(DataResponse::new(concurso)))
}

/// DELETE /api/concursos
///
/// Only drafts can be deleted.
pub async fn eliminar_concurso(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConcursoIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let concurso = buscar_concurso(&state.db, query.id_concurso).await?;
    if concurso.estatus != EstatusConcurso::Borrador {
        return Err(ApiError::conflict(format!(
            "Solo se pueden eliminar concursos en BORRADOR (estatus actual: {})",
            concurso.estatus
        )));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM concursos WHERE id_concurso = $1 AND estatus = 'BORRADOR'")
        .bind(concurso.id_concurso)
        .execute(&mut *tx)
        .await?;

    // The originating request becomes available again
    if let Some(id_solicitud) = concurso.id_solicitud {
        sqlx::query(
            "UPDATE solicitudes SET estatus = 'APROBADA', updated_at = NOW() WHERE id_solicitud = $1 AND estatus = 'EN_CONCURSO'",
        )
        .bind(id_solicitud)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        id_concurso = concurso.id_concurso,
        "Concurso deleted"
    );

    Ok(MessageResponse::with_code(
        format!("Concurso {} eliminado", concurso.numero_concurso),
        "CONCURSO_ELIMINADO",
    ))
}
