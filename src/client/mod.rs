//! Typed async client for the portal REST API
//!
//! One method per endpoint and verb, grouped by resource. Arguments are
//! validated before any I/O and failures surface as [`ClientError`], whose
//! `Display` is the message to show the user.

pub mod admin;
pub mod articulos;
pub mod bases;
pub mod concursos;
pub mod config;
pub mod contratos;
pub mod documentos;
pub mod error;
pub mod eventos;
pub mod firmas;
pub mod http;
pub mod partidas;
pub mod proveedores;
pub mod revision;
pub mod secretarias;
pub mod session;
pub mod solicitudes;

pub use admin::ListadoAdmin;
pub use config::ClientConfig;
pub use documentos::ArchivoCarga;
pub use error::{ClientError, ClientResult};
pub use eventos::EventListener;
pub use http::PortalClient;
pub use revision::{AdminProveedoresStore, ProveedoresAdminApi};
pub use session::SessionContext;
