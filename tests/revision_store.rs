//! Optimistic supplier status changes against fake backends

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use parking_lot::Mutex;
use portal_compras::client::{
    AdminProveedoresStore, ClientConfig, ClientError, ClientResult, EventListener, ListadoAdmin,
    PortalClient, ProveedoresAdminApi,
};
use portal_compras::domain::admin::{contar_pendientes, CambioEstatusRequest, FiltroProveedores};
use portal_compras::domain::eventos::EVENTO_ESTATUS_REVISION;
use portal_compras::domain::{EstatusRevision, EventoPortal, Proveedor, TipoProveedor};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

fn proveedor(id: i32, estatus: EstatusRevision) -> Proveedor {
    let now = Utc::now();
    Proveedor {
        id_proveedor: id,
        id_usuario: id + 100,
        tipo_proveedor: TipoProveedor::Moral,
        rfc: format!("ABC0101{id:02}XY1"),
        razon_social: Some(format!("Comercializadora {id} SA de CV")),
        nombre: None,
        apellido_paterno: None,
        apellido_materno: None,
        curp: None,
        representante_legal: None,
        correo: format!("proveedor{id}@example.com"),
        telefono: None,
        calle: None,
        numero_exterior: None,
        colonia: None,
        codigo_postal: None,
        municipio: None,
        estado: None,
        giro: None,
        es_proveedor_eventos: false,
        estatus_revision: estatus,
        comentario_revision: None,
        activo: true,
        created_at: now,
        updated_at: now,
    }
}

/// In-memory server state; `fallar` makes the next PUT fail.
#[derive(Default)]
struct Servidor {
    filas: Mutex<Vec<Proveedor>>,
    fallar: AtomicBool,
    listados: AtomicUsize,
}

impl Servidor {
    fn con(filas: Vec<Proveedor>) -> Self {
        Self {
            filas: Mutex::new(filas),
            ..Default::default()
        }
    }
}

impl ProveedoresAdminApi for Servidor {
    async fn listar(&self) -> ClientResult<ListadoAdmin> {
        self.listados.fetch_add(1, Ordering::SeqCst);
        let filas = self.filas.lock().clone();
        Ok(ListadoAdmin {
            pendientes_revision: contar_pendientes(&filas),
            proveedores: filas,
        })
    }

    async fn cambiar_estatus(
        &self,
        id_proveedor: i32,
        nuevo: EstatusRevision,
        _comentario: Option<String>,
    ) -> ClientResult<Proveedor> {
        if self.fallar.swap(false, Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: StatusCode::CONFLICT,
                message: "El proveedor fue modificado por otro administrador".to_string(),
            });
        }
        let mut filas = self.filas.lock();
        let fila = filas
            .iter_mut()
            .find(|p| p.id_proveedor == id_proveedor)
            .ok_or(ClientError::RowNotFound(id_proveedor))?;
        fila.estatus_revision = nuevo;
        Ok(fila.clone())
    }
}

#[tokio::test]
async fn successful_change_updates_row_and_counter() {
    let servidor = Servidor::con(vec![
        proveedor(1, EstatusRevision::PendienteRevision),
        proveedor(2, EstatusRevision::PendienteRevision),
        proveedor(3, EstatusRevision::Aprobado),
    ]);
    let store = AdminProveedoresStore::new(servidor);
    let servidor = store.api();
    store.cargar().await.unwrap();
    assert_eq!(store.pendientes(), 2);

    store
        .cambiar_estatus(1, EstatusRevision::Aprobado)
        .await
        .unwrap();

    assert_eq!(store.estatus_de(1), Some(EstatusRevision::Aprobado));
    assert_eq!(store.pendientes(), 1);
    assert_eq!(store.error(), None);
    // No reload on success
    assert_eq!(servidor.listados.load(Ordering::SeqCst), 1);

    store
        .cambiar_estatus(3, EstatusRevision::PendienteRevision)
        .await
        .unwrap();
    assert_eq!(store.pendientes(), 2);
}

#[tokio::test]
async fn failed_change_rolls_back_and_resyncs_counter() {
    let servidor = Servidor::con(vec![
        proveedor(1, EstatusRevision::PendienteRevision),
        proveedor(2, EstatusRevision::EnRevision),
    ]);
    let store = AdminProveedoresStore::new(servidor);
    let servidor = store.api();
    store.cargar().await.unwrap();
    assert_eq!(store.pendientes(), 1);

    // Another admin resubmits supplier 2 behind our back
    servidor.filas.lock()[1].estatus_revision = EstatusRevision::PendienteRevision;
    servidor.fallar.store(true, Ordering::SeqCst);

    let err = store
        .cambiar_estatus(1, EstatusRevision::Rechazado)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "El proveedor fue modificado por otro administrador"
    );
    assert_eq!(store.error().as_deref(), Some(err.to_string().as_str()));
    assert_eq!(store.estatus_de(1), Some(EstatusRevision::PendienteRevision));
    // The resync picked up the server's count, not just the rollback
    assert_eq!(store.pendientes(), 2);
    assert_eq!(servidor.listados.load(Ordering::SeqCst), 2);
    assert!(!store.en_proceso(1));

    // The next successful change clears the page error
    store
        .cambiar_estatus(1, EstatusRevision::Aprobado)
        .await
        .unwrap();
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn filters_apply_to_loaded_rows() {
    let mut eventos = proveedor(3, EstatusRevision::Aprobado);
    eventos.es_proveedor_eventos = true;
    let servidor = Servidor::con(vec![
        proveedor(1, EstatusRevision::PendienteRevision),
        proveedor(2, EstatusRevision::Aprobado),
        eventos,
    ]);
    let store = AdminProveedoresStore::new(servidor);
    store.cargar().await.unwrap();

    let aprobados = store.filtrados(&FiltroProveedores {
        estatus_revision: Some(EstatusRevision::Aprobado),
        ..Default::default()
    });
    assert_eq!(aprobados.len(), 2);

    let solo_eventos = store.filtrados(&FiltroProveedores {
        solo_eventos: true,
        busqueda: "COMERCIALIZADORA".to_string(),
        ..Default::default()
    });
    assert_eq!(solo_eventos.len(), 1);
    assert_eq!(solo_eventos[0].id_proveedor, 3);
}

#[tokio::test]
async fn events_trigger_reloads() {
    let servidor = Servidor::con(vec![proveedor(1, EstatusRevision::Aprobado)]);
    let store = AdminProveedoresStore::new(servidor);
    let servidor = store.api();
    store.cargar().await.unwrap();
    assert_eq!(store.pendientes(), 0);

    servidor.filas.lock()[0].estatus_revision = EstatusRevision::PendienteRevision;

    let evento = EventoPortal::admin_proveedores(EVENTO_ESTATUS_REVISION, 1, "PENDIENTE_REVISION");
    let frame = format!(
        "event: {}\ndata: {}\n\n",
        evento.evento,
        serde_json::to_string(&evento).unwrap()
    );
    let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(frame.into_bytes())];

    store
        .escuchar(EventListener::desde_stream(futures::stream::iter(chunks)))
        .await;

    assert_eq!(store.pendientes(), 1);
    assert_eq!(servidor.listados.load(Ordering::SeqCst), 2);
}

// Same flow through the real HTTP client

async fn listar_http(State(servidor): State<Arc<Servidor>>) -> impl IntoResponse {
    let filas = servidor.filas.lock().clone();
    let pendientes = contar_pendientes(&filas);
    Json(json!({ "data": filas, "meta": { "pendientes_revision": pendientes } }))
}

async fn cambiar_http(
    State(servidor): State<Arc<Servidor>>,
    Json(req): Json<CambioEstatusRequest>,
) -> axum::response::Response {
    match servidor
        .cambiar_estatus(req.id_proveedor, req.estatus_revision, req.comentario)
        .await
    {
        Ok(fila) => Json(json!({ "data": fila })).into_response(),
        Err(e) => (
            StatusCode::CONFLICT,
            Json(json!({ "code": "CONFLICT", "message": e.to_string() })),
        )
            .into_response(),
    }
}

#[tokio::test]
async fn store_works_over_http() {
    let servidor = Arc::new(Servidor::con(vec![
        proveedor(1, EstatusRevision::PendienteRevision),
        proveedor(2, EstatusRevision::Aprobado),
    ]));
    let router = Router::new()
        .route("/api/adminProveedores", get(listar_http).put(cambiar_http))
        .with_state(servidor.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = PortalClient::new(&ClientConfig::new(format!("http://{addr}"))).unwrap();
    let store = AdminProveedoresStore::new(client);
    store.cargar().await.unwrap();
    assert_eq!(store.pendientes(), 1);

    store
        .cambiar_estatus(1, EstatusRevision::EnRevision)
        .await
        .unwrap();
    assert_eq!(store.pendientes(), 0);
    assert_eq!(
        servidor.filas.lock()[0].estatus_revision,
        EstatusRevision::EnRevision
    );

    servidor.fallar.store(true, Ordering::SeqCst);
    let err = store
        .cambiar_estatus(2, EstatusRevision::Rechazado)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(store.estatus_de(2), Some(EstatusRevision::Aprobado));
}
