//! Admin supplier-review routes
//!
//! Protected admin endpoints for:
//! - Listing suppliers with the pending-review counter
//! - Changing a supplier's review status (audited in `bitacora_revision`)
//! - Dashboard counts and per-supplier review history
//!
//! All routes require `rol = admin`.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::columna;
use super::proveedores::{buscar_proveedor, ProveedorRow, PROVEEDOR_COLUMNS};
use crate::api::{ApiResponse, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::admin::{
    patron_busqueda, AdminProveedoresQuery, BitacoraRevision, CambioEstatusRequest,
    ListadoAdminMeta, ResumenRevision,
};
use crate::domain::eventos::{EventoPortal, EVENTO_ESTATUS_REVISION};
use crate::domain::proveedores::{EstatusRevision, Proveedor, ProveedorIdQuery};
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct BitacoraRow {
    id_bitacora: i32,
    id_proveedor: i32,
    id_usuario_admin: i32,
    estatus_anterior: String,
    estatus_nuevo: String,
    comentario: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BitacoraRow> for BitacoraRevision {
    type Error = ApiError;

    fn try_from(row: BitacoraRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_bitacora: row.id_bitacora,
            id_proveedor: row.id_proveedor,
            id_usuario_admin: row.id_usuario_admin,
            estatus_anterior: columna(&row.estatus_anterior)?,
            estatus_nuevo: columna(&row.estatus_nuevo)?,
            comentario: row.comentario,
            created_at: row.created_at,
        })
    }
}

async fn contar_pendientes(db: &sqlx::PgPool) -> Result<i64, ApiError> {
    let pendientes: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM proveedores WHERE estatus_revision = $1")
            .bind(EstatusRevision::PendienteRevision.as_str())
            .fetch_one(db)
            .await?;
    Ok(pendientes)
}

/// GET /api/adminProveedores
///
/// Every supplier, newest first. `meta.pendientes_revision` counts all
/// pending profiles regardless of the filters.
pub async fn listar_proveedores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminProveedoresQuery>,
    admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let busqueda = query.q.as_deref().and_then(patron_busqueda);

    let sql = format!(
        r#"
        SELECT {PROVEEDOR_COLUMNS}
        FROM proveedores
        WHERE ($1::text IS NULL OR estatus_revision = $1)
          AND ($2::text IS NULL OR tipo_proveedor = $2)
          AND ($3::text IS NULL
               OR razon_social ILIKE $3 ESCAPE '\'
               OR CONCAT_WS(' ', nombre, apellido_paterno, apellido_materno) ILIKE $3 ESCAPE '\'
               OR rfc ILIKE $3 ESCAPE '\'
               OR correo ILIKE $3 ESCAPE '\')
        ORDER BY created_at DESC
        "#
    );

    let rows = sqlx::query_as::<_, ProveedorRow>(&sql)
        .bind(query.estatus_revision.map(|e| e.as_str()))
        .bind(query.tipo_proveedor.map(|t| t.as_str()))
        .bind(busqueda)
        .fetch_all(&state.db)
        .await?;

    let proveedores = rows
        .into_iter()
        .map(Proveedor::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let pendientes_revision = contar_pendientes(&state.db).await?;

    tracing::debug!(
        admin_id = admin.user_id,
        total = proveedores.len(),
        pendientes_revision,
        "Admin supplier list"
    );

    Ok(ApiResponse::with_meta(
        proveedores,
        ListadoAdminMeta {
            pendientes_revision,
        },
    ))
}

/// PUT /api/adminProveedores
///
/// Change a supplier's review status. The previous status, the new one and
/// the comment are recorded in the revision log within the same transaction.
pub async fn cambiar_estatus(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<CambioEstatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let anterior: String = sqlx::query_scalar(
        "SELECT estatus_revision FROM proveedores WHERE id_proveedor = $1 FOR UPDATE",
    )
    .bind(req.id_proveedor)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;
    let anterior: EstatusRevision = columna(&anterior)?;

    let comentario = req
        .comentario
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    sqlx::query(
        r#"
        UPDATE proveedores
        SET estatus_revision = $2, comentario_revision = $3, updated_at = NOW()
        WHERE id_proveedor = $1
        "#,
    )
    .bind(req.id_proveedor)
    .bind(req.estatus_revision.as_str())
    .bind(comentario)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO bitacora_revision (id_proveedor, id_usuario_admin, estatus_anterior, estatus_nuevo, comentario)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(req.id_proveedor)
    .bind(admin.user_id)
    .bind(anterior.as_str())
    .bind(req.estatus_revision.as_str())
    .bind(comentario)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        admin_id = admin.user_id,
        id_proveedor = req.id_proveedor,
        anterior = %anterior,
        nuevo = %req.estatus_revision,
        "Supplier review status changed"
    );

    let proveedor = buscar_proveedor(&state.db, req.id_proveedor).await?;

    state.events.publish(EventoPortal::admin_proveedores(
        EVENTO_ESTATUS_REVISION,
        proveedor.id_proveedor,
        format!(
            "{}: {} → {}",
            proveedor.nombre_mostrado(),
            anterior,
            proveedor.estatus_revision
        ),
    ));

    Ok(Json(DataResponse::new(proveedor)))
}

/// GET /api/adminProveedores/resumen
pub async fn resumen_revision(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let conteos: Vec<(String, i64)> = sqlx::query_as(
        "SELECT estatus_revision, COUNT(*) FROM proveedores GROUP BY estatus_revision",
    )
    .fetch_all(&state.db)
    .await?;

    // Every status appears, even with zero suppliers
    let mut por_estatus: BTreeMap<String, i64> = EstatusRevision::ALL
        .iter()
        .map(|e| (e.as_str().to_string(), 0))
        .collect();
    for (estatus, total) in conteos {
        *por_estatus.entry(estatus).or_default() += total;
    }

    let total = por_estatus.values().sum();

    Ok(Json(DataResponse::new(ResumenRevision { por_estatus, total })))
}

/// GET /api/adminProveedores/bitacora
pub async fn bitacora_revision(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorIdQuery>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let rows = sqlx::query_as::<_, BitacoraRow>(
        r#"
        SELECT id_bitacora, id_proveedor, id_usuario_admin, estatus_anterior,
               estatus_nuevo, comentario, created_at
        FROM bitacora_revision
        WHERE id_proveedor = $1
        ORDER BY created_at DESC, id_bitacora DESC
        "#,
    )
    .bind(query.id_proveedor)
    .fetch_all(&state.db)
    .await?;

    let bitacora = rows
        .into_iter()
        .map(BitacoraRevision::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(bitacora)))
}
