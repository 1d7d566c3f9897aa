//! Admin domain types
//!
//! Types for the supplier review panel: status changes, the revision audit
//! trail and the in-memory list filtering used by the admin page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::proveedores::{EstatusRevision, Proveedor, TipoProveedor};

/// Request to change a supplier's review status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambioEstatusRequest {
    pub id_proveedor: i32,
    pub estatus_revision: EstatusRevision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
}

/// Query params for `GET /api/adminProveedores`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminProveedoresQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estatus_revision: Option<EstatusRevision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_proveedor: Option<TipoProveedor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// `meta` block of the admin listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ListadoAdminMeta {
    pub pendientes_revision: i64,
}

/// One row of the revision audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BitacoraRevision {
    pub id_bitacora: i32,
    pub id_proveedor: i32,
    pub id_usuario_admin: i32,
    pub estatus_anterior: EstatusRevision,
    pub estatus_nuevo: EstatusRevision,
    pub comentario: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counts per review status for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResumenRevision {
    pub por_estatus: BTreeMap<String, i64>,
    pub total: i64,
}

/// Number of rows carrying the pending-review sentinel.
pub fn contar_pendientes(proveedores: &[Proveedor]) -> i64 {
    proveedores
        .iter()
        .filter(|p| p.estatus_revision.es_pendiente())
        .count() as i64
}

/// Counter delta when a row moves from `anterior` to `nuevo`.
pub fn delta_pendientes(anterior: EstatusRevision, nuevo: EstatusRevision) -> i64 {
    match (anterior.es_pendiente(), nuevo.es_pendiente()) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// `ILIKE` pattern matching `q` anywhere, with `\`, `%` and `_` taken
/// literally. `None` for a blank search.
pub fn patron_busqueda(q: &str) -> Option<String> {
    let q = q.trim();
    if q.is_empty() {
        return None;
    }

    let mut patron = String::with_capacity(q.len() + 2);
    patron.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            patron.push('\\');
        }
        patron.push(c);
    }
    patron.push('%');
    Some(patron)
}

/// Admin list filter applied over rows already in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltroProveedores {
    pub estatus_revision: Option<EstatusRevision>,
    pub tipo_proveedor: Option<TipoProveedor>,
    pub solo_eventos: bool,
    pub busqueda: String,
}

impl FiltroProveedores {
    pub fn coincide(&self, p: &Proveedor) -> bool {
        if self.estatus_revision.is_some_and(|e| e != p.estatus_revision) {
            return false;
        }
        if self.tipo_proveedor.is_some_and(|t| t != p.tipo_proveedor) {
            return false;
        }
        if self.solo_eventos && !p.es_proveedor_eventos {
            return false;
        }

        let termino = self.busqueda.trim().to_lowercase();
        if termino.is_empty() {
            return true;
        }

        let nombre = p.nombre_mostrado();
        let coincide = [nombre.as_str(), p.rfc.as_str(), p.correo.as_str()]
            .into_iter()
            .any(|campo| campo.to_lowercase().contains(&termino));
        coincide
    }

    pub fn aplicar<'a>(&self, proveedores: &'a [Proveedor]) -> Vec<&'a Proveedor> {
        proveedores.iter().filter(|p| self.coincide(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proveedores::fixtures::proveedor;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(patron_busqueda("  "), None);
        assert_eq!(patron_busqueda(" acme ").as_deref(), Some("%acme%"));
        assert_eq!(patron_busqueda("A_C").as_deref(), Some(r"%A\_C%"));
        assert_eq!(patron_busqueda("100%").as_deref(), Some(r"%100\%%"));
        assert_eq!(patron_busqueda(r"a\b").as_deref(), Some(r"%a\\b%"));
    }

    #[test]
    fn counts_pending_rows() {
        let rows = vec![
            proveedor(1, TipoProveedor::Moral, EstatusRevision::PendienteRevision),
            proveedor(2, TipoProveedor::Moral, EstatusRevision::Aprobado),
            proveedor(3, TipoProveedor::Fisica, EstatusRevision::PendienteRevision),
        ];
        assert_eq!(contar_pendientes(&rows), 2);
    }

    #[test]
    fn delta_only_moves_across_the_sentinel() {
        use EstatusRevision::*;
        assert_eq!(delta_pendientes(PendienteRevision, Aprobado), -1);
        assert_eq!(delta_pendientes(Rechazado, PendienteRevision), 1);
        assert_eq!(delta_pendientes(EnRevision, Aprobado), 0);
        assert_eq!(delta_pendientes(PendienteRevision, PendienteRevision), 0);
    }

    #[test]
    fn filter_by_status_type_and_text() {
        let mut eventos = proveedor(3, TipoProveedor::Fisica, EstatusRevision::PendienteRevision);
        eventos.es_proveedor_eventos = true;
        let rows = vec![
            proveedor(1, TipoProveedor::Moral, EstatusRevision::PendienteRevision),
            proveedor(2, TipoProveedor::Moral, EstatusRevision::Aprobado),
            eventos,
        ];

        let pendientes = FiltroProveedores {
            estatus_revision: Some(EstatusRevision::PendienteRevision),
            ..Default::default()
        };
        let ids: Vec<_> = pendientes.aplicar(&rows).iter().map(|p| p.id_proveedor).collect();
        assert_eq!(ids, vec![1, 3]);

        let morales = FiltroProveedores {
            tipo_proveedor: Some(TipoProveedor::Moral),
            busqueda: "comercializadora 2".to_string(),
            ..Default::default()
        };
        let ids: Vec<_> = morales.aplicar(&rows).iter().map(|p| p.id_proveedor).collect();
        assert_eq!(ids, vec![2]);

        let solo_eventos = FiltroProveedores {
            solo_eventos: true,
            ..Default::default()
        };
        assert_eq!(solo_eventos.aplicar(&rows).len(), 1);
    }

    #[test]
    fn search_matches_rfc_and_email_case_insensitively() {
        let rows = vec![proveedor(4, TipoProveedor::Fisica, EstatusRevision::EnRevision)];
        let por_rfc = FiltroProveedores {
            busqueda: "goma8001".to_string(),
            ..Default::default()
        };
        assert_eq!(por_rfc.aplicar(&rows).len(), 1);

        let por_correo = FiltroProveedores {
            busqueda: "PROVEEDOR4@".to_string(),
            ..Default::default()
        };
        assert_eq!(por_correo.aplicar(&rows).len(), 1);

        let sin_match = FiltroProveedores {
            busqueda: "zzz".to_string(),
            ..Default::default()
        };
        assert!(sin_match.aplicar(&rows).is_empty());
    }
}
