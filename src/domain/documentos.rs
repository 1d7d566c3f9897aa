use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Review status of a single uploaded document
    pub enum EstatusDocumento {
        Pendiente => "PENDIENTE",
        Aprobado => "APROBADO",
        Rechazado => "RECHAZADO",
    }
}

/// Uploaded file metadata plus its review status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentoProveedor {
    pub id_documento: i32,
    pub id_proveedor: i32,
    pub tipo_documento: String,
    pub nombre_original: String,
    pub ruta_archivo: String,
    pub tipo_mime: String,
    pub tamano_bytes: i64,
    pub estatus_revision: EstatusDocumento,
    pub comentario_revision: Option<String>,
    pub fecha_carga: DateTime<Utc>,
    pub fecha_revision: Option<DateTime<Utc>>,
}

/// Admin review of an uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisarDocumentoRequest {
    pub id_documento: i32,
    pub estatus_revision: EstatusDocumento,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario_revision: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentoIdQuery {
    pub id_documento: i32,
}
