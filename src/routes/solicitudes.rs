//! Purchase request routes
//!
//! Secretaría users see and raise requests for their own secretaría; admins
//! see all of them and decide on pending ones.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::columna;
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AuthContext, RequireAdmin, RequireAuth, Rol};
use crate::domain::solicitudes::{
    CambioEstatusSolicitudRequest, CrearSolicitudRequest, EstatusSolicitud, Solicitud,
    SolicitudesQuery,
};
use crate::error::ApiError;

const SOLICITUD_COLUMNS: &str = r#"
    id_solicitud, id_secretaria, id_usuario_solicitante, descripcion,
    justificacion, monto_estimado, estatus, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct SolicitudRow {
    id_solicitud: i32,
    id_secretaria: i32,
    id_usuario_solicitante: i32,
    descripcion: String,
    justificacion: Option<String>,
    monto_estimado: Option<Decimal>,
    estatus: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SolicitudRow> for Solicitud {
    type Error = ApiError;

    fn try_from(row: SolicitudRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_solicitud: row.id_solicitud,
            id_secretaria: row.id_secretaria,
            id_usuario_solicitante: row.id_usuario_solicitante,
            descripcion: row.descripcion,
            justificacion: row.justificacion,
            monto_estimado: row.monto_estimado,
            estatus: columna(&row.estatus)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Secretaría users are pinned to their own secretaría.
fn secretaria_efectiva(auth: &AuthContext, pedida: Option<i32>) -> Result<Option<i32>, ApiError> {
    match auth.rol {
        Rol::Admin => Ok(pedida),
        Rol::Secretaria => match (auth.id_secretaria, pedida) {
            (Some(propia), Some(otra)) if propia != otra => Err(ApiError::forbidden(
                "Solo puede consultar solicitudes de su secretaría",
            )),
            (Some(propia), _) => Ok(Some(propia)),
            (None, _) => Err(ApiError::forbidden("El usuario no tiene secretaría asignada")),
        },
        Rol::Proveedor => Err(ApiError::forbidden(
            "Operación reservada al personal de la dependencia",
        )),
    }
}

/// GET /api/solicitudes
pub async fn listar_solicitudes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolicitudesQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let id_secretaria = secretaria_efectiva(&auth, query.id_secretaria)?;

    let sql = format!(
        r#"
        SELECT {SOLICITUD_COLUMNS}
        FROM solicitudes
        WHERE ($1::int IS NULL OR id_secretaria = $1)
          AND ($2::text IS NULL OR estatus = $2)
        ORDER BY created_at DESC
        "#
    );
    let solicitudes = sqlx::query_as::<_, SolicitudRow>(&sql)
        .bind(id_secretaria)
        .bind(query.estatus.map(|e| e.as_str()))
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(Solicitud::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(solicitudes)))
}

/// POST /api/solicitudes
pub async fn crear_solicitud(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CrearSolicitudRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id_secretaria = secretaria_efectiva(&auth, Some(req.id_secretaria))?
        .unwrap_or(req.id_secretaria);

    if req.descripcion.trim().is_empty() {
        return Err(ApiError::bad_request("La descripción es obligatoria"));
    }
    if req.monto_estimado.is_some_and(|m| m.is_sign_negative()) {
        return Err(ApiError::bad_request("El monto estimado no puede ser negativo"));
    }

    let sql = format!(
        r#"
        INSERT INTO solicitudes (id_secretaria, id_usuario_solicitante, descripcion, justificacion, monto_estimado)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SOLICITUD_COLUMNS}
        "#
    );
    let solicitud: Solicitud = sqlx::query_as::<_, SolicitudRow>(&sql)
        .bind(id_secretaria)
        .bind(auth.user_id)
        .bind(req.descripcion.trim())
        .bind(&req.justificacion)
        .bind(req.monto_estimado)
        .fetch_one(&state.db)
        .await?
        .try_into()?;

    tracing::info!(
        id_solicitud = solicitud.id_solicitud,
        id_secretaria,
        user_id = auth.user_id,
        "Purchase request created"
    );

    Ok(Created(solicitud))
}

/// PATCH /api/solicitudes
pub async fn cambiar_estatus_solicitud(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<CambioEstatusSolicitudRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let actual: String =
        sqlx::query_scalar("SELECT estatus FROM solicitudes WHERE id_solicitud = $1 FOR UPDATE")
            .bind(req.id_solicitud)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Solicitud no encontrada"))?;
    let actual: EstatusSolicitud = columna(&actual)?;

    if !actual.puede_transicionar_a(req.estatus) {
        return Err(ApiError::conflict(format!(
            "No se puede cambiar una solicitud de {actual} a {}",
            req.estatus
        )));
    }

    let sql = format!(
        r#"
        UPDATE solicitudes SET estatus = $2, updated_at = NOW()
        WHERE id_solicitud = $1
        RETURNING {SOLICITUD_COLUMNS}
        "#
    );
    let solicitud: Solicitud = sqlx::query_as::<_, SolicitudRow>(&sql)
        .bind(req.id_solicitud)
        .bind(req.estatus.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

    tx.commit().await?;

    tracing::info!(
        admin_id = admin.user_id,
        id_solicitud = solicitud.id_solicitud,
        anterior = %actual,
        nuevo = %solicitud.estatus,
        "Purchase request status changed"
    );

    Ok(Json(DataResponse::new(solicitud)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexto(rol: Rol, id_secretaria: Option<i32>) -> AuthContext {
        AuthContext {
            user_id: 9,
            rol,
            id_proveedor: None,
            id_secretaria,
            sistema: None,
        }
    }

    #[test]
    fn admin_keeps_requested_filter() {
        let admin = contexto(Rol::Admin, None);
        assert_eq!(secretaria_efectiva(&admin, Some(3)).unwrap(), Some(3));
        assert_eq!(secretaria_efectiva(&admin, None).unwrap(), None);
    }

    #[test]
    fn secretaria_is_pinned_to_its_own() {
        let usuario = contexto(Rol::Secretaria, Some(2));
        assert_eq!(secretaria_efectiva(&usuario, None).unwrap(), Some(2));
        assert_eq!(secretaria_efectiva(&usuario, Some(2)).unwrap(), Some(2));
        assert!(matches!(
            secretaria_efectiva(&usuario, Some(5)),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn proveedores_cannot_see_requests() {
        let proveedor = AuthContext {
            id_proveedor: Some(1),
            ..contexto(Rol::Proveedor, None)
        };
        assert!(secretaria_efectiva(&proveedor, None).is_err());
    }
}
