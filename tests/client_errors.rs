//! Portal client error handling against a throwaway HTTP server

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use portal_compras::client::{ClientConfig, ClientError, PortalClient};
use portal_compras::domain::admin::AdminProveedoresQuery;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn servidor(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn rutas(hits: Arc<AtomicUsize>) -> Router {
    let contar = move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": "NOT_FOUND", "message": "Proveedor no encontrado" })),
            )
        }
    };

    Router::new()
        .route("/api/proveedores", get(contar))
        .route(
            "/api/adminProveedores",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>") }),
        )
        .route(
            "/api/secretarias",
            get(|| async {
                Json(json!({
                    "data": [{ "id_secretaria": 1, "nombre": "Secretaría de Finanzas", "siglas": "SEFIN", "activa": true }]
                }))
            }),
        )
        .route(
            "/api/solicitudes",
            get(|headers: HeaderMap| async move {
                let autorizado = headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v == "Bearer token-prueba");
                if autorizado {
                    Json(json!({ "data": [] })).into_response()
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "code": "UNAUTHORIZED", "message": "Token requerido" })),
                    )
                        .into_response()
                }
            }),
        )
}

async fn cliente() -> (PortalClient, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = servidor(rutas(hits.clone())).await;
    let client = PortalClient::new(&ClientConfig::new(base)).unwrap();
    (client, hits)
}

#[tokio::test]
async fn body_message_is_surfaced() {
    let (client, hits) = cliente().await;

    let err = client.obtener_proveedor(5).await.unwrap_err();
    assert_eq!(err.to_string(), "Proveedor no encontrado");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unparsable_body_falls_back_to_status_text() {
    let (client, _) = cliente().await;

    let err = client
        .listar_proveedores_admin(&AdminProveedoresQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));
    assert_eq!(
        err.to_string(),
        "Error al obtener proveedores: Internal Server Error"
    );
}

#[tokio::test]
async fn invalid_arguments_fail_before_any_request() {
    let (client, hits) = cliente().await;

    let err = client.obtener_proveedor(0).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    let err = client.obtener_proveedor_por_usuario(-3).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    let err = client.registrar_partida(4, "   ").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn data_envelope_is_unwrapped() {
    let (client, _) = cliente().await;

    let secretarias = client.listar_secretarias().await.unwrap();
    assert_eq!(secretarias.len(), 1);
    assert_eq!(secretarias[0].siglas, "SEFIN");
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let (client, _) = cliente().await;

    let err = client
        .listar_solicitudes(&Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Token requerido");

    let solicitudes = client
        .with_token("token-prueba")
        .listar_solicitudes(&Default::default())
        .await
        .unwrap();
    assert!(solicitudes.is_empty());
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PortalClient::new(&ClientConfig::new(format!("http://{addr}"))).unwrap();
    let err = client.listar_secretarias().await.unwrap_err();
    assert!(matches!(err, ClientError::Network { .. }));
    assert!(err.to_string().starts_with("Error al obtener secretarías"));
}
