//! Bases calls (`/api/bases`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientResult};
use super::http::PortalClient;
use crate::domain::bases::{ActualizarBasesRequest, Bases, BasesIdQuery, CrearBasesRequest};
use crate::domain::concursos::ConcursoIdQuery;

const ENDPOINT: &str = "/api/bases";

impl PortalClient {
    pub async fn obtener_bases(&self, id_concurso: i32) -> ClientResult<Bases> {
        exigir_id("id_concurso", id_concurso)?;
        self.get_data(ENDPOINT, &ConcursoIdQuery { id_concurso }, "Error al obtener bases")
            .await
    }

    pub async fn crear_bases(&self, req: &CrearBasesRequest) -> ClientResult<Bases> {
        exigir_id("id_concurso", req.id_concurso)?;
        exigir_texto("objeto", &req.objeto)?;
        self.json_data(Method::POST, ENDPOINT, req, "Error al crear bases")
            .await
    }

    pub async fn actualizar_bases(&self, req: &ActualizarBasesRequest) -> ClientResult<Bases> {
        exigir_id("id_bases", req.id_bases)?;
        self.json_data(Method::PUT, ENDPOINT, req, "Error al actualizar bases")
            .await
    }

    pub async fn publicar_bases(&self, id_bases: i32) -> ClientResult<Bases> {
        exigir_id("id_bases", id_bases)?;
        self.json_data(
            Method::PATCH,
            ENDPOINT,
            &BasesIdQuery { id_bases },
            "Error al publicar bases",
        )
        .await
    }
}
