//! Supplier documents (`/api/proveedoresDocumentos`)
//!
//! Uploads go as `multipart/form-data` with the fields `id_proveedor`,
//! `tipo_documento` and `archivo`.

use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientError, ClientResult};
use super::http::PortalClient;
use crate::api::{DataResponse, MessageResponse};
use crate::domain::documentos::{DocumentoIdQuery, RevisarDocumentoRequest};
use crate::domain::proveedores::ProveedorIdQuery;
use crate::domain::requisitos::Checklist;
use crate::domain::{DocumentoProveedor, EstatusDocumento};

const ENDPOINT: &str = "/api/proveedoresDocumentos";

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct ArchivoCarga {
    pub nombre: String,
    pub tipo_mime: String,
    pub contenido: Vec<u8>,
}

impl PortalClient {
    pub async fn listar_documentos(&self, id_proveedor: i32) -> ClientResult<Vec<DocumentoProveedor>> {
        exigir_id("id_proveedor", id_proveedor)?;
        self.get_data(
            ENDPOINT,
            &ProveedorIdQuery { id_proveedor },
            "Error al obtener documentos",
        )
        .await
    }

    pub async fn checklist_documentos(&self, id_proveedor: i32) -> ClientResult<Checklist> {
        exigir_id("id_proveedor", id_proveedor)?;
        self.get_data(
            "/api/proveedoresDocumentos/checklist",
            &ProveedorIdQuery { id_proveedor },
            "Error al obtener checklist de documentos",
        )
        .await
    }

    /// Upload (or replace) the document of type `tipo_documento`.
    pub async fn subir_documento(
        &self,
        id_proveedor: i32,
        tipo_documento: &str,
        archivo: ArchivoCarga,
    ) -> ClientResult<DocumentoProveedor> {
        exigir_id("id_proveedor", id_proveedor)?;
        exigir_texto("tipo_documento", tipo_documento)?;
        exigir_texto("nombre del archivo", &archivo.nombre)?;
        if archivo.contenido.is_empty() {
            return Err(ClientError::InvalidArgument("El archivo está vacío".to_string()));
        }

        let part = Part::bytes(archivo.contenido)
            .file_name(archivo.nombre)
            .mime_str(&archivo.tipo_mime)
            .map_err(|_| {
                ClientError::InvalidArgument(format!("Tipo MIME inválido: {}", archivo.tipo_mime))
            })?;
        let form = Form::new()
            .text("id_proveedor", id_proveedor.to_string())
            .text("tipo_documento", tipo_documento.trim().to_string())
            .part("archivo", part);

        let req = self.request(Method::POST, ENDPOINT)?.multipart(form);
        let envelope: DataResponse<DocumentoProveedor> =
            self.enviar(req, "Error al subir documento").await?;
        Ok(envelope.data)
    }

    pub async fn revisar_documento(
        &self,
        id_documento: i32,
        estatus_revision: EstatusDocumento,
        comentario_revision: Option<String>,
    ) -> ClientResult<DocumentoProveedor> {
        exigir_id("id_documento", id_documento)?;

        let body = RevisarDocumentoRequest {
            id_documento,
            estatus_revision,
            comentario_revision,
        };
        self.json_data(Method::PUT, ENDPOINT, &body, "Error al revisar documento")
            .await
    }

    pub async fn eliminar_documento(&self, id_documento: i32) -> ClientResult<MessageResponse> {
        exigir_id("id_documento", id_documento)?;
        let req = self
            .request(Method::DELETE, ENDPOINT)?
            .query(&DocumentoIdQuery { id_documento });
        self.enviar(req, "Error al eliminar documento").await
    }
}
