//! Contract calls (`/api/contratos`)

use reqwest::Method;

use super::error::{exigir_id, ClientError, ClientResult};
use super::http::PortalClient;
use crate::domain::contratos::{
    validar_vigencia_y_monto, ActualizarContratoRequest, Contrato, ContratosQuery,
    GenerarContratoRequest,
};

const ENDPOINT: &str = "/api/contratos";

impl PortalClient {
    pub async fn obtener_contrato(&self, id_contrato: i32) -> ClientResult<Contrato> {
        exigir_id("id_contrato", id_contrato)?;
        let query = ContratosQuery {
            id_contrato: Some(id_contrato),
            ..Default::default()
        };
        self.get_data(ENDPOINT, &query, "Error al obtener contrato").await
    }

    /// Contracts of a concurso, of a supplier, or both.
    pub async fn listar_contratos(
        &self,
        id_concurso: Option<i32>,
        id_proveedor: Option<i32>,
    ) -> ClientResult<Vec<Contrato>> {
        if let Some(id) = id_concurso {
            exigir_id("id_concurso", id)?;
        }
        if let Some(id) = id_proveedor {
            exigir_id("id_proveedor", id)?;
        }

        let query = ContratosQuery {
            id_contrato: None,
            id_concurso,
            id_proveedor,
        };
        self.get_data(ENDPOINT, &query, "Error al obtener contratos").await
    }

    pub async fn generar_contrato(&self, req: &GenerarContratoRequest) -> ClientResult<Contrato> {
        exigir_id("id_concurso", req.id_concurso)?;
        exigir_id("id_proveedor", req.id_proveedor)?;
        validar_vigencia_y_monto(req.fecha_inicio, req.fecha_fin, req.monto_total)
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))?;

        self.json_data(Method::POST, ENDPOINT, req, "Error al generar contrato")
            .await
    }

    pub async fn actualizar_contrato(&self, req: &ActualizarContratoRequest) -> ClientResult<Contrato> {
        exigir_id("id_contrato", req.id_contrato)?;
        self.json_data(Method::PUT, ENDPOINT, req, "Error al actualizar contrato")
            .await
    }
}
