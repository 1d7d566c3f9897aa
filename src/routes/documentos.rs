//! Supplier document routes
//!
//! Uploads are multipart (`id_proveedor`, `tipo_documento`, `archivo`). A
//! supplier holds at most one document per `tipo_documento`: uploading the
//! same key again replaces the record and removes the previous file.

use axum::{
    extract::{Multipart, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::columna;
use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::{RequireAdmin, RequireAuth};
use crate::domain::documentos::{
    DocumentoIdQuery, DocumentoProveedor, EstatusDocumento, RevisarDocumentoRequest,
};
use crate::domain::eventos::{EventoPortal, EVENTO_DOCUMENTO_CARGADO, EVENTO_PROVEEDOR_ACTUALIZADO};
use crate::domain::proveedores::ProveedorIdQuery;
use crate::domain::requisitos::{es_clave_conocida, resolver_checklist};
use crate::error::ApiError;

const DOCUMENTO_COLUMNS: &str = r#"
    id_documento, id_proveedor, tipo_documento, nombre_original, ruta_archivo,
    tipo_mime, tamano_bytes, estatus_revision, comentario_revision, fecha_carga,
    fecha_revision
"#;

#[derive(Debug, sqlx::FromRow)]
struct DocumentoRow {
    id_documento: i32,
    id_proveedor: i32,
    tipo_documento: String,
    nombre_original: String,
    ruta_archivo: String,
    tipo_mime: String,
    tamano_bytes: i64,
    estatus_revision: String,
    comentario_revision: Option<String>,
    fecha_carga: DateTime<Utc>,
    fecha_revision: Option<DateTime<Utc>>,
}

impl TryFrom<DocumentoRow> for DocumentoProveedor {
    type Error = ApiError;

    fn try_from(row: DocumentoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_documento: row.id_documento,
            id_proveedor: row.id_proveedor,
            tipo_documento: row.tipo_documento,
            nombre_original: row.nombre_original,
            ruta_archivo: row.ruta_archivo,
            tipo_mime: row.tipo_mime,
            tamano_bytes: row.tamano_bytes,
            estatus_revision: columna(&row.estatus_revision)?,
            comentario_revision: row.comentario_revision,
            fecha_carga: row.fecha_carga,
            fecha_revision: row.fecha_revision,
        })
    }
}

async fn documentos_de(
    db: &sqlx::PgPool,
    id_proveedor: i32,
) -> Result<Vec<DocumentoProveedor>, ApiError> {
    let sql = format!(
        "SELECT {DOCUMENTO_COLUMNS} FROM documentos_proveedor WHERE id_proveedor = $1 ORDER BY fecha_carga, id_documento"
    );
    sqlx::query_as::<_, DocumentoRow>(&sql)
        .bind(id_proveedor)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(DocumentoProveedor::try_from)
        .collect()
}

async fn buscar_documento(
    db: &sqlx::PgPool,
    id_documento: i32,
) -> Result<DocumentoProveedor, ApiError> {
    let sql = format!("SELECT {DOCUMENTO_COLUMNS} FROM documentos_proveedor WHERE id_documento = $1");
    sqlx::query_as::<_, DocumentoRow>(&sql)
        .bind(id_documento)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Documento no encontrado"))?
        .try_into()
}

/// GET /api/proveedoresDocumentos
pub async fn listar_documentos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(query.id_proveedor)?;
    let documentos = documentos_de(&state.db, query.id_proveedor).await?;
    Ok(Json(DataResponse::new(documentos)))
}

/// Parsed multipart upload
struct Carga {
    id_proveedor: i32,
    tipo_documento: String,
    nombre_original: String,
    tipo_mime: String,
    contenido: Vec<u8>,
}

async fn leer_carga(mut multipart: Multipart) -> Result<Carga, ApiError> {
    let mut id_proveedor = None;
    let mut tipo_documento = None;
    let mut archivo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulario inválido: {e}")))?
    {
        match field.name() {
            Some("id_proveedor") => {
                let texto = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                id_proveedor = Some(
                    texto
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| ApiError::bad_request("id_proveedor inválido"))?,
                );
            }
            Some("tipo_documento") => {
                let texto = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                tipo_documento = Some(texto.trim().to_string());
            }
            Some("archivo") => {
                let nombre = field.file_name().unwrap_or("documento").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("No se pudo leer el archivo: {e}")))?;
                archivo = Some((nombre, mime, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let id_proveedor = id_proveedor.ok_or_else(|| ApiError::bad_request("Falta id_proveedor"))?;
    let tipo_documento =
        tipo_documento.ok_or_else(|| ApiError::bad_request("Falta tipo_documento"))?;
    let (nombre_original, tipo_mime, contenido) =
        archivo.ok_or_else(|| ApiError::bad_request("Falta el archivo"))?;

    if contenido.is_empty() {
        return Err(ApiError::bad_request("El archivo está vacío"));
    }

    Ok(Carga {
        id_proveedor,
        tipo_documento,
        nombre_original,
        tipo_mime,
        contenido,
    })
}

/// POST /api/proveedoresDocumentos
pub async fn subir_documento(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let carga = leer_carga(multipart).await?;
    auth.exigir_proveedor(carga.id_proveedor)?;

    if !es_clave_conocida(&carga.tipo_documento) {
        return Err(ApiError::bad_request(format!(
            "Tipo de documento desconocido: {}",
            carga.tipo_documento
        )));
    }

    let anterior: Option<String> = sqlx::query_scalar(
        "SELECT ruta_archivo FROM documentos_proveedor WHERE id_proveedor = $1 AND tipo_documento = $2",
    )
    .bind(carga.id_proveedor)
    .bind(&carga.tipo_documento)
    .fetch_optional(&state.db)
    .await?;

    let ruta = state
        .storage
        .guardar(
            carga.id_proveedor,
            &carga.tipo_documento,
            &carga.nombre_original,
            &carga.contenido,
        )
        .await?;

    let sql = format!(
        r#"
        INSERT INTO documentos_proveedor
            (id_proveedor, tipo_documento, nombre_original, ruta_archivo, tipo_mime, tamano_bytes)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id_proveedor, tipo_documento) DO UPDATE SET
            nombre_original = EXCLUDED.nombre_original,
            ruta_archivo = EXCLUDED.ruta_archivo,
            tipo_mime = EXCLUDED.tipo_mime,
            tamano_bytes = EXCLUDED.tamano_bytes,
            estatus_revision = 'PENDIENTE',
            comentario_revision = NULL,
            fecha_carga = NOW(),
            fecha_revision = NULL
        RETURNING {DOCUMENTO_COLUMNS}
        "#
    );

    let resultado = sqlx::query_as::<_, DocumentoRow>(&sql)
        .bind(carga.id_proveedor)
        .bind(&carga.tipo_documento)
        .bind(&carga.nombre_original)
        .bind(&ruta)
        .bind(&carga.tipo_mime)
        .bind(carga.contenido.len() as i64)
        .fetch_one(&state.db)
        .await;

    let documento: DocumentoProveedor = match resultado {
        Ok(row) => row.try_into()?,
        Err(e) => {
            // The new file has no record pointing at it
            if let Err(err) = state.storage.eliminar(&ruta).await {
                tracing::warn!(error = %err, ruta = %ruta, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    if let Some(anterior) = anterior.filter(|a| *a != ruta) {
        if let Err(e) = state.storage.eliminar(&anterior).await {
            tracing::warn!(error = %e, ruta = %anterior, "Failed to remove replaced document");
        }
    }

    tracing::info!(
        id_proveedor = documento.id_proveedor,
        tipo_documento = %documento.tipo_documento,
        bytes = documento.tamano_bytes,
        "Supplier document uploaded"
    );

    state.events.publish(EventoPortal::admin_proveedores(
        EVENTO_DOCUMENTO_CARGADO,
        documento.id_proveedor,
        format!("Documento cargado: {}", documento.tipo_documento),
    ));

    Ok(Created(documento))
}

/// PUT /api/proveedoresDocumentos
pub async fn revisar_documento(
    State(state): State<Arc<AppState>>,
    admin: RequireAdmin,
    Json(req): Json<RevisarDocumentoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sql = format!(
        r#"
        UPDATE documentos_proveedor
        SET estatus_revision = $2, comentario_revision = $3, fecha_revision = NOW()
        WHERE id_documento = $1
        RETURNING {DOCUMENTO_COLUMNS}
        "#
    );

    let documento: DocumentoProveedor = sqlx::query_as::<_, DocumentoRow>(&sql)
        .bind(req.id_documento)
        .bind(req.estatus_revision.as_str())
        .bind(&req.comentario_revision)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Documento no encontrado"))?
        .try_into()?;

    tracing::info!(
        admin_id = admin.user_id,
        id_documento = documento.id_documento,
        estatus = %documento.estatus_revision,
        "Supplier document reviewed"
    );

    state.events.publish(EventoPortal::admin_proveedores(
        EVENTO_PROVEEDOR_ACTUALIZADO,
        documento.id_proveedor,
        format!(
            "Documento {} marcado como {}",
            documento.tipo_documento, documento.estatus_revision
        ),
    ));

    Ok(Json(DataResponse::new(documento)))
}

/// DELETE /api/proveedoresDocumentos
///
/// Suppliers may not delete a document an admin already approved.
pub async fn eliminar_documento(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentoIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let documento = buscar_documento(&state.db, query.id_documento).await?;
    auth.exigir_proveedor(documento.id_proveedor)?;

    if documento.estatus_revision == EstatusDocumento::Aprobado && !auth.es_admin() {
        return Err(ApiError::conflict(
            "No se puede eliminar un documento aprobado",
        ));
    }

    sqlx::query("DELETE FROM documentos_proveedor WHERE id_documento = $1")
        .bind(documento.id_documento)
        .execute(&state.db)
        .await?;

    if let Err(e) = state.storage.eliminar(&documento.ruta_archivo).await {
        tracing::warn!(error = %e, ruta = %documento.ruta_archivo, "Failed to remove document file");
    }

    tracing::info!(
        id_documento = documento.id_documento,
        id_proveedor = documento.id_proveedor,
        "Supplier document deleted"
    );

    Ok(MessageResponse::with_code(
        format!("Documento {} eliminado", documento.tipo_documento),
        "DOCUMENTO_ELIMINADO",
    ))
}

/// GET /api/proveedoresDocumentos/checklist
pub async fn checklist_documentos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(query.id_proveedor)?;

    let (tipo_proveedor, es_proveedor_eventos): (String, bool) = sqlx::query_as(
        "SELECT tipo_proveedor, es_proveedor_eventos FROM proveedores WHERE id_proveedor = $1",
    )
    .bind(query.id_proveedor)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;

    let subidos = documentos_de(&state.db, query.id_proveedor).await?;
    let checklist = resolver_checklist(&tipo_proveedor, es_proveedor_eventos, &subidos)?;

    Ok(Json(DataResponse::new(checklist)))
}
