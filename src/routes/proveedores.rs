//! Supplier profile routes
//!
//! - `GET /api/proveedores?id_proveedor=` or `?id_usuario=`
//! - `POST /api/proveedores` self-registration (account + profile)
//! - `PUT /api/proveedores` profile edits; a rejected profile is resubmitted

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{columna, conflicto_si_duplicado};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::eventos::{EventoPortal, EVENTO_PROVEEDOR_ACTUALIZADO};
use crate::domain::proveedores::{
    ActualizarProveedorRequest, CrearProveedorRequest, Proveedor, ProveedorCreado,
    ProveedorQuery, UsuarioProveedor,
};
use crate::error::ApiError;

pub(crate) const PROVEEDOR_COLUMNS: &str = r#"
    id_proveedor, id_usuario, tipo_proveedor, rfc, razon_social, nombre,
    apellido_paterno, apellido_materno, curp, representante_legal, correo,
    telefono, calle, numero_exterior, colonia, codigo_postal, municipio, estado,
    giro, es_proveedor_eventos, estatus_revision, comentario_revision, activo,
    created_at, updated_at
"#;

/// Database row for a supplier
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProveedorRow {
    id_proveedor: i32,
    id_usuario: i32,
    tipo_proveedor: String,
    rfc: String,
    razon_social: Option<String>,
    nombre: Option<String>,
    apellido_paterno: Option<String>,
    apellido_materno: Option<String>,
    curp: Option<String>,
    representante_legal: Option<String>,
    correo: String,
    telefono: Option<String>,
    calle: Option<String>,
    numero_exterior: Option<String>,
    colonia: Option<String>,
    codigo_postal: Option<String>,
    municipio: Option<String>,
    estado: Option<String>,
    giro: Option<String>,
    es_proveedor_eventos: bool,
    estatus_revision: String,
    comentario_revision: Option<String>,
    activo: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProveedorRow> for Proveedor {
    type Error = ApiError;

    fn try_from(row: ProveedorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_proveedor: row.id_proveedor,
            id_usuario: row.id_usuario,
            tipo_proveedor: columna(&row.tipo_proveedor)?,
            rfc: row.rfc,
            razon_social: row.razon_social,
            nombre: row.nombre,
            apellido_paterno: row.apellido_paterno,
            apellido_materno: row.apellido_materno,
            curp: row.curp,
            representante_legal: row.representante_legal,
            correo: row.correo,
            telefono: row.telefono,
            calle: row.calle,
            numero_exterior: row.numero_exterior,
            colonia: row.colonia,
            codigo_postal: row.codigo_postal,
            municipio: row.municipio,
            estado: row.estado,
            giro: row.giro,
            es_proveedor_eventos: row.es_proveedor_eventos,
            estatus_revision: columna(&row.estatus_revision)?,
            comentario_revision: row.comentario_revision,
            activo: row.activo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UsuarioRow {
    id_usuario: i32,
    correo: String,
    nombre_usuario: String,
    activo: bool,
    created_at: DateTime<Utc>,
}

impl From<UsuarioRow> for UsuarioProveedor {
    fn from(row: UsuarioRow) -> Self {
        Self {
            id_usuario: row.id_usuario,
            correo: row.correo,
            nombre_usuario: row.nombre_usuario,
            activo: row.activo,
            created_at: row.created_at,
        }
    }
}

pub(crate) async fn buscar_proveedor(
    db: &sqlx::PgPool,
    id_proveedor: i32,
) -> Result<Proveedor, ApiError> {
    let sql = format!("SELECT {PROVEEDOR_COLUMNS} FROM proveedores WHERE id_proveedor = $1");
    sqlx::query_as::<_, ProveedorRow>(&sql)
        .bind(id_proveedor)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?
        .try_into()
}

/// GET /api/proveedores
pub async fn obtener_proveedor(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let proveedor = match (query.id_proveedor, query.id_usuario) {
        (Some(id_proveedor), _) => {
            auth.exigir_proveedor(id_proveedor)?;
            buscar_proveedor(&state.db, id_proveedor).await?
        }
        (None, Some(id_usuario)) => {
            let sql = format!("SELECT {PROVEEDOR_COLUMNS} FROM proveedores WHERE id_usuario = $1");
            let proveedor: Proveedor = sqlx::query_as::<_, ProveedorRow>(&sql)
                .bind(id_usuario)
                .fetch_optional(&state.db)
                .await?
                .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?
                .try_into()?;
            auth.exigir_proveedor(proveedor.id_proveedor)?;
            proveedor
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "Se requiere id_proveedor o id_usuario",
            ))
        }
    };

    Ok(Json(DataResponse::new(proveedor)))
}

/// POST /api/proveedores
///
/// Creates the login account and the supplier profile together. New profiles
/// start in `PENDIENTE_REVISION`.
pub async fn registrar_proveedor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CrearProveedorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tipo = req.validar().map_err(ApiError::bad_request)?;
    let rfc = req.rfc.trim().to_uppercase();

    let mut tx = state.db.begin().await?;

    let usuario: UsuarioProveedor = sqlx::query_as::<_, UsuarioRow>(
        r#"
        INSERT INTO usuarios_proveedor (correo, nombre_usuario)
        VALUES ($1, $2)
        RETURNING id_usuario, correo, nombre_usuario, activo, created_at
        "#,
    )
    .bind(req.correo.trim())
    .bind(req.nombre_usuario.trim())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflicto_si_duplicado(e, "Ya existe una cuenta con ese correo"))?
    .into();

    let sql = format!(
        r#"
        INSERT INTO proveedores (
            id_usuario, tipo_proveedor, rfc, razon_social, nombre, apellido_paterno,
            apellido_materno, curp, representante_legal, correo, telefono, calle,
            numero_exterior, colonia, codigo_postal, municipio, estado, giro,
            es_proveedor_eventos
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING {PROVEEDOR_COLUMNS}
        "#
    );
    let proveedor: Proveedor = sqlx::query_as::<_, ProveedorRow>(&sql)
        .bind(usuario.id_usuario)
        .bind(tipo.as_str())
        .bind(&rfc)
        .bind(&req.razon_social)
        .bind(&req.nombre)
        .bind(&req.apellido_paterno)
        .bind(&req.apellido_materno)
        .bind(&req.curp)
        .bind(&req.representante_legal)
        .bind(&usuario.correo)
        .bind(&req.telefono)
        .bind(&req.calle)
        .bind(&req.numero_exterior)
        .bind(&req.colonia)
        .bind(&req.codigo_postal)
        .bind(&req.municipio)
        .bind(&req.estado)
        .bind(&req.giro)
        .bind(req.es_proveedor_eventos)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflicto_si_duplicado(e, "Ya existe un proveedor con ese RFC"))?
        .try_into()?;

    tx.commit().await?;

    tracing::info!(
        id_proveedor = proveedor.id_proveedor,
        tipo = %tipo,
        "Supplier registered"
    );

    state.events.publish(EventoPortal::admin_proveedores(
        EVENTO_PROVEEDOR_ACTUALIZADO,
        proveedor.id_proveedor,
        format!("Nuevo proveedor registrado: {}", proveedor.nombre_mostrado()),
    ));

    Ok(Created(ProveedorCreado { usuario, proveedor }))
}

/// PUT /api/proveedores
///
/// Updates the provided fields. A profile in `RECHAZADO` or
/// `REQUIERE_CORRECCION` goes back to `PENDIENTE_REVISION`.
pub async fn actualizar_proveedor(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ActualizarProveedorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(req.id_proveedor)?;

    let sql = format!(
        r#"
        UPDATE proveedores SET
            razon_social = COALESCE($2, razon_social),
            nombre = COALESCE($3, nombre),
            apellido_paterno = COALESCE($4, apellido_paterno),
            apellido_materno = COALESCE($5, apellido_materno),
            curp = COALESCE($6, curp),
            representante_legal = COALESCE($7, representante_legal),
            correo = COALESCE($8, correo),
            telefono = COALESCE($9, telefono),
            calle = COALESCE($10, calle),
            numero_exterior = COALESCE($11, numero_exterior),
            colonia = COALESCE($12, colonia),
            codigo_postal = COALESCE($13, codigo_postal),
            municipio = COALESCE($14, municipio),
            estado = COALESCE($15, estado),
            giro = COALESCE($16, giro),
            es_proveedor_eventos = COALESCE($17, es_proveedor_eventos),
            estatus_revision = CASE
                WHEN estatus_revision IN ('RECHAZADO', 'REQUIERE_CORRECCION')
                THEN 'PENDIENTE_REVISION'
                ELSE estatus_revision
            END,
            updated_at = NOW()
        WHERE id_proveedor = $1
        RETURNING {PROVEEDOR_COLUMNS}
        "#
    );

    let proveedor: Proveedor = sqlx::query_as::<_, ProveedorRow>(&sql)
        .bind(req.id_proveedor)
        .bind(&req.razon_social)
        .bind(&req.nombre)
        .bind(&req.apellido_paterno)
        .bind(&req.apellido_materno)
        .bind(&req.curp)
        .bind(&req.representante_legal)
        .bind(&req.correo)
        .bind(&req.telefono)
        .bind(&req.calle)
        .bind(&req.numero_exterior)
        .bind(&req.colonia)
        .bind(&req.codigo_postal)
        .bind(&req.municipio)
        .bind(&req.estado)
        .bind(&req.giro)
        .bind(req.es_proveedor_eventos)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?
        .try_into()?;

    tracing::info!(
        id_proveedor = proveedor.id_proveedor,
        estatus = %proveedor.estatus_revision,
        "Supplier profile updated"
    );

    state.events.publish(EventoPortal::admin_proveedores(
        EVENTO_PROVEEDOR_ACTUALIZADO,
        proveedor.id_proveedor,
        format!("{} actualizó su perfil", proveedor.nombre_mostrado()),
    ));

    Ok(Json(DataResponse::new(proveedor)))
}
