//! Admin supplier review state with optimistic status changes
//!
//! A status change is applied to the local row (and the pending counter)
//! before the PUT is sent. When the PUT fails the row is put back, the
//! page-level error is set and the list is re-fetched so the counter matches
//! the server again. The lock is never held across an await.

use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::admin::ListadoAdmin;
use super::error::{ClientError, ClientResult};
use super::eventos::EventListener;
use super::http::PortalClient;
use crate::domain::admin::{
    contar_pendientes, delta_pendientes, AdminProveedoresQuery, FiltroProveedores,
};
use crate::domain::{EstatusRevision, Proveedor};

/// The two calls the review page makes.
#[allow(async_fn_in_trait)]
pub trait ProveedoresAdminApi {
    async fn listar(&self) -> ClientResult<ListadoAdmin>;

    async fn cambiar_estatus(
        &self,
        id_proveedor: i32,
        nuevo: EstatusRevision,
        comentario: Option<String>,
    ) -> ClientResult<Proveedor>;
}

impl ProveedoresAdminApi for PortalClient {
    async fn listar(&self) -> ClientResult<ListadoAdmin> {
        self.listar_proveedores_admin(&AdminProveedoresQuery::default())
            .await
    }

    async fn cambiar_estatus(
        &self,
        id_proveedor: i32,
        nuevo: EstatusRevision,
        comentario: Option<String>,
    ) -> ClientResult<Proveedor> {
        self.cambiar_estatus_revision(id_proveedor, nuevo, comentario)
            .await
    }
}

#[derive(Debug, Default)]
struct EstadoRevision {
    proveedores: Vec<Proveedor>,
    pendientes: i64,
    error: Option<String>,
    en_proceso: HashSet<i32>,
}

pub struct AdminProveedoresStore<A> {
    api: A,
    estado: Mutex<EstadoRevision>,
}

impl<A: ProveedoresAdminApi> AdminProveedoresStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            estado: Mutex::new(EstadoRevision::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the full list. The counter is recomputed from the rows.
    pub async fn cargar(&self) -> ClientResult<()> {
        match self.sincronizar().await {
            Ok(()) => {
                self.estado.lock().error = None;
                Ok(())
            }
            Err(e) => {
                self.estado.lock().error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace rows and counter without touching the page error.
    async fn sincronizar(&self) -> ClientResult<()> {
        let listado = self.api.listar().await?;

        let mut estado = self.estado.lock();
        estado.pendientes = contar_pendientes(&listado.proveedores);
        estado.proveedores = listado.proveedores;
        debug!(
            total = estado.proveedores.len(),
            pendientes = estado.pendientes,
            "Supplier review list loaded"
        );
        Ok(())
    }

    pub async fn cambiar_estatus(&self, id_proveedor: i32, nuevo: EstatusRevision) -> ClientResult<()> {
        self.cambiar_estatus_con_comentario(id_proveedor, nuevo, None)
            .await
    }

    pub async fn cambiar_estatus_con_comentario(
        &self,
        id_proveedor: i32,
        nuevo: EstatusRevision,
        comentario: Option<String>,
    ) -> ClientResult<()> {
        let anterior = self.aplicar_local(id_proveedor, nuevo)?;

        match self.api.cambiar_estatus(id_proveedor, nuevo, comentario).await {
            Ok(actualizado) => {
                let mut guard = self.estado.lock();
                let estado = &mut *guard;
                estado.en_proceso.remove(&id_proveedor);
                estado.error = None;
                // Count from what the row shows now, a reload may have reset it
                if let Some(fila) = estado
                    .proveedores
                    .iter_mut()
                    .find(|p| p.id_proveedor == id_proveedor)
                {
                    estado.pendientes +=
                        delta_pendientes(fila.estatus_revision, actualizado.estatus_revision);
                    *fila = actualizado;
                }

                info!(id_proveedor, estatus = %nuevo, "Supplier review status changed");
                Ok(())
            }
            Err(e) => {
                {
                    let mut guard = self.estado.lock();
                    let estado = &mut *guard;
                    estado.en_proceso.remove(&id_proveedor);
                    estado.error = Some(e.to_string());

                    // A reload may already have replaced the row
                    if let Some(fila) = estado
                        .proveedores
                        .iter_mut()
                        .find(|p| p.id_proveedor == id_proveedor && p.estatus_revision == nuevo)
                    {
                        fila.estatus_revision = anterior;
                        estado.pendientes -= delta_pendientes(anterior, nuevo);
                    }
                }

                warn!(id_proveedor, error = %e, "Supplier status change failed, rolled back");

                if let Err(recarga) = self.sincronizar().await {
                    warn!(error = %recarga, "Supplier list resync failed");
                }
                Err(e)
            }
        }
    }

    /// Mark the row busy, apply `nuevo` and adjust the counter. Returns the
    /// previous status.
    fn aplicar_local(&self, id_proveedor: i32, nuevo: EstatusRevision) -> ClientResult<EstatusRevision> {
        let mut guard = self.estado.lock();
        let estado = &mut *guard;

        if estado.en_proceso.contains(&id_proveedor) {
            return Err(ClientError::RowBusy(id_proveedor));
        }
        let fila = estado
            .proveedores
            .iter_mut()
            .find(|p| p.id_proveedor == id_proveedor)
            .ok_or(ClientError::RowNotFound(id_proveedor))?;

        let anterior = fila.estatus_revision;
        fila.estatus_revision = nuevo;
        estado.pendientes += delta_pendientes(anterior, nuevo);
        estado.en_proceso.insert(id_proveedor);
        Ok(anterior)
    }

    /// Reload the list on every realtime event until the stream ends.
    pub async fn escuchar(&self, mut listener: EventListener) {
        while let Some(evento) = listener.siguiente().await {
            match evento {
                Ok(evento) => {
                    debug!(evento = %evento.evento, id_proveedor = ?evento.id_proveedor, "Portal event received");
                    if let Err(e) = self.cargar().await {
                        warn!(error = %e, "Reload after portal event failed");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Portal event stream ended with an error");
                    break;
                }
            }
        }
    }

    pub fn proveedores(&self) -> Vec<Proveedor> {
        self.estado.lock().proveedores.clone()
    }

    pub fn filtrados(&self, filtro: &FiltroProveedores) -> Vec<Proveedor> {
        let estado = self.estado.lock();
        filtro
            .aplicar(&estado.proveedores)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn pendientes(&self) -> i64 {
        self.estado.lock().pendientes
    }

    pub fn error(&self) -> Option<String> {
        self.estado.lock().error.clone()
    }

    pub fn en_proceso(&self, id_proveedor: i32) -> bool {
        self.estado.lock().en_proceso.contains(&id_proveedor)
    }

    pub fn estatus_de(&self, id_proveedor: i32) -> Option<EstatusRevision> {
        self.estado
            .lock()
            .proveedores
            .iter()
            .find(|p| p.id_proveedor == id_proveedor)
            .map(|p| p.estatus_revision)
    }
}
