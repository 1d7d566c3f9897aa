//! Signature workflow (`/api/firmaEnvia`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientError, ClientResult};
use super::http::PortalClient;
use crate::domain::firmas::{
    EnviarFirmaRequest, EstatusFirma, Firma, Firmante, FirmasQuery, RespuestaFirmaRequest,
};

const ENDPOINT: &str = "/api/firmaEnvia";

impl PortalClient {
    pub async fn listar_firmas(&self, id_contrato: i32) -> ClientResult<Vec<Firma>> {
        exigir_id("id_contrato", id_contrato)?;
        self.get_data(ENDPOINT, &FirmasQuery { id_contrato }, "Error al obtener firmas")
            .await
    }

    /// Send a draft contract to the given signers.
    pub async fn enviar_a_firma(
        &self,
        id_contrato: i32,
        firmantes: Vec<Firmante>,
    ) -> ClientResult<Vec<Firma>> {
        exigir_id("id_contrato", id_contrato)?;
        for firmante in &firmantes {
            exigir_texto("nombre del firmante", &firmante.nombre)?;
            exigir_texto("correo del firmante", &firmante.correo)?;
        }

        let body = EnviarFirmaRequest { id_contrato, firmantes };
        body.validar().map_err(ClientError::InvalidArgument)?;

        self.json_data(Method::POST, ENDPOINT, &body, "Error al enviar a firma")
            .await
    }

    pub async fn responder_firma(&self, id_firma: i32, estatus: EstatusFirma) -> ClientResult<Firma> {
        exigir_id("id_firma", id_firma)?;
        if estatus == EstatusFirma::Enviada {
            return Err(ClientError::InvalidArgument(
                "La respuesta debe ser FIRMADA o RECHAZADA".to_string(),
            ));
        }

        let body = RespuestaFirmaRequest { id_firma, estatus };
        self.json_data(Method::PATCH, ENDPOINT, &body, "Error al responder firma")
            .await
    }
}
