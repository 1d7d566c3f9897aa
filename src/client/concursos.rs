//! Concurso calls (`/api/concursos`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientResult};
use super::http::PortalClient;
use crate::api::{MessageResponse, Paginated};
use crate::domain::concursos::{
    ActualizarConcursoRequest, CambioEstatusConcursoRequest, Concurso, ConcursoIdQuery,
    ConcursosQuery, CrearConcursoRequest, EstatusConcurso,
};

const ENDPOINT: &str = "/api/concursos";

impl PortalClient {
    /// One page of concursos. `filtro.id_concurso` is ignored here; use
    /// [`PortalClient::obtener_concurso`] for a single record.
    pub async fn listar_concursos(&self, filtro: &ConcursosQuery) -> ClientResult<Paginated<Concurso>> {
        if let Some(id_secretaria) = filtro.id_secretaria {
            exigir_id("id_secretaria", id_secretaria)?;
        }
        let filtro = ConcursosQuery {
            id_concurso: None,
            ..filtro.clone()
        };
        let req = self.request(Method::GET, ENDPOINT)?.query(&filtro);
        self.enviar(req, "Error al obtener concursos").await
    }

    pub async fn obtener_concurso(&self, id_concurso: i32) -> ClientResult<Concurso> {
        exigir_id("id_concurso", id_concurso)?;
        let query = ConcursosQuery {
            id_concurso: Some(id_concurso),
            ..Default::default()
        };
        self.get_data(ENDPOINT, &query, "Error al obtener concurso").await
    }

    pub async fn crear_concurso(&self, req: &CrearConcursoRequest) -> ClientResult<Concurso> {
        exigir_texto("numero_concurso", &req.numero_concurso)?;
        exigir_texto("nombre", &req.nombre)?;
        exigir_id("id_secretaria", req.id_secretaria)?;
        if let Some(id_solicitud) = req.id_solicitud {
            exigir_id("id_solicitud", id_solicitud)?;
        }

        self.json_data(Method::POST, ENDPOINT, req, "Error al crear concurso")
            .await
    }

    pub async fn actualizar_concurso(&self, req: &ActualizarConcursoRequest) -> ClientResult<Concurso> {
        exigir_id("id_concurso", req.id_concurso)?;
        self.json_data(Method::PUT, ENDPOINT, req, "Error al actualizar concurso")
            .await
    }

    /// Move a concurso to `estatus`. `ADJUDICADO` needs the winner.
    pub async fn cambiar_estatus_concurso(
        &self,
        id_concurso: i32,
        estatus: EstatusConcurso,
        id_proveedor_ganador: Option<i32>,
    ) -> ClientResult<Concurso> {
        exigir_id("id_concurso", id_concurso)?;
        if let Some(ganador) = id_proveedor_ganador {
            exigir_id("id_proveedor_ganador", ganador)?;
        }

        let body = CambioEstatusConcursoRequest {
            id_concurso,
            estatus,
            id_proveedor_ganador,
        };
        self.json_data(Method::PATCH, ENDPOINT, &body, "Error al cambiar estatus del concurso")
            .await
    }

    pub async fn eliminar_concurso(&self, id_concurso: i32) -> ClientResult<MessageResponse> {
        exigir_id("id_concurso", id_concurso)?;
        let req = self
            .request(Method::DELETE, ENDPOINT)?
            .query(&ConcursoIdQuery { id_concurso });
        self.enviar(req, "Error al eliminar concurso").await
    }
}
