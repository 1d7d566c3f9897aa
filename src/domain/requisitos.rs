//! Document requirements per supplier type
//!
//! Every supplier must upload a fixed set of documents that depends on its
//! legal form (`moral` / `fisica`). Suppliers registered for events
//! (`es_proveedor_eventos`) additionally upload the events set, appended after
//! the base set. The checklist joins those static tables against the
//! documents already uploaded, matching on `tipo_documento`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::documentos::DocumentoProveedor;
use super::proveedores::TipoProveedor;

/// A required document key and the label shown to the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentoRequerido {
    pub clave: &'static str,
    pub descripcion: &'static str,
}

const fn req(clave: &'static str, descripcion: &'static str) -> DocumentoRequerido {
    DocumentoRequerido { clave, descripcion }
}

pub const REQUIRED_DOCS_MORAL: &[DocumentoRequerido] = &[
    req("ACTA_CONSTITUTIVA", "Acta constitutiva y sus modificaciones"),
    req("PODER_REPRESENTANTE", "Poder notarial del representante legal"),
    req("IDENTIFICACION_REPRESENTANTE", "Identificación oficial del representante legal"),
    req("CONSTANCIA_FISCAL", "Constancia de situación fiscal"),
    req("OPINION_CUMPLIMIENTO_SAT", "Opinión de cumplimiento de obligaciones fiscales (SAT)"),
    req("OPINION_CUMPLIMIENTO_IMSS", "Opinión de cumplimiento en materia de seguridad social (IMSS)"),
    req("COMPROBANTE_DOMICILIO", "Comprobante de domicilio fiscal"),
    req("ESTADO_CUENTA_BANCARIO", "Carátula de estado de cuenta bancario"),
];

pub const REQUIRED_DOCS_FISICA: &[DocumentoRequerido] = &[
    req("IDENTIFICACION_OFICIAL", "Identificación oficial vigente"),
    req("CURP", "Clave Única de Registro de Población"),
    req("CONSTANCIA_FISCAL", "Constancia de situación fiscal"),
    req("OPINION_CUMPLIMIENTO_SAT", "Opinión de cumplimiento de obligaciones fiscales (SAT)"),
    req("COMPROBANTE_DOMICILIO", "Comprobante de domicilio fiscal"),
    req("ESTADO_CUENTA_BANCARIO", "Carátula de estado de cuenta bancario"),
];

pub const REQUIRED_DOCS_EVENTOS: &[DocumentoRequerido] = &[
    req("CARTA_EXPERIENCIA_EVENTOS", "Carta de experiencia en organización de eventos"),
    req("POLIZA_RESPONSABILIDAD_CIVIL", "Póliza de seguro de responsabilidad civil"),
    req("PORTAFOLIO_EVENTOS", "Portafolio de eventos realizados"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequisitoError {
    #[error("Tipo de proveedor no reconocido: '{0}'")]
    TipoDesconocido(String),
}

/// Upload state of one checklist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoRequisito {
    Subido,
    Pendiente,
}

/// One row of the supplier's document checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemChecklist {
    pub tipo_documento: String,
    pub descripcion: String,
    pub estado: EstadoRequisito,
    pub documento: Option<DocumentoProveedor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub items: Vec<ItemChecklist>,
    pub pendientes: usize,
    pub completo: bool,
}

/// Parse a supplier type as typed by users or stored by older records
/// (case and surrounding whitespace are ignored).
pub fn parse_tipo(tipo_proveedor: &str) -> Result<TipoProveedor, RequisitoError> {
    tipo_proveedor
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| RequisitoError::TipoDesconocido(tipo_proveedor.to_string()))
}

/// Required document keys for a supplier, in display order.
pub fn documentos_requeridos(
    tipo: TipoProveedor,
    es_proveedor_eventos: bool,
) -> Vec<DocumentoRequerido> {
    let base = match tipo {
        TipoProveedor::Moral => REQUIRED_DOCS_MORAL,
        TipoProveedor::Fisica => REQUIRED_DOCS_FISICA,
    };

    let mut requeridos = base.to_vec();
    if es_proveedor_eventos {
        requeridos.extend_from_slice(REQUIRED_DOCS_EVENTOS);
    }
    requeridos
}

/// First uploaded document whose `tipo_documento` equals `clave`.
pub fn documento_subido<'a>(
    subidos: &'a [DocumentoProveedor],
    clave: &str,
) -> Option<&'a DocumentoProveedor> {
    subidos.iter().find(|d| d.tipo_documento == clave)
}

/// Build the checklist for a supplier. An unrecognized type yields an error and no items.
pub fn resolver_checklist(
    tipo_proveedor: &str,
    es_proveedor_eventos: bool,
    subidos: &[DocumentoProveedor],
) -> Result<Checklist, RequisitoError> {
    let tipo = parse_tipo(tipo_proveedor)?;

    let items: Vec<ItemChecklist> = documentos_requeridos(tipo, es_proveedor_eventos)
        .into_iter()
        .map(|requerido| {
            let documento = documento_subido(subidos, requerido.clave).cloned();
            ItemChecklist {
                tipo_documento: requerido.clave.to_string(),
                descripcion: requerido.descripcion.to_string(),
                estado: if documento.is_some() {
                    EstadoRequisito::Subido
                } else {
                    EstadoRequisito::Pendiente
                },
                documento,
            }
        })
        .collect();

    let pendientes = items
        .iter()
        .filter(|i| i.estado == EstadoRequisito::Pendiente)
        .count();

    Ok(Checklist {
        completo: pendientes == 0,
        pendientes,
        items,
    })
}

/// Whether `clave` is a document key any supplier could be asked for.
pub fn es_clave_conocida(clave: &str) -> bool {
    REQUIRED_DOCS_MORAL
        .iter()
        .chain(REQUIRED_DOCS_FISICA)
        .chain(REQUIRED_DOCS_EVENTOS)
        .any(|r| r.clave == clave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::documentos::EstatusDocumento;
    use chrono::Utc;
    use std::collections::HashSet;

    fn subido(id: i32, tipo: &str) -> DocumentoProveedor {
        DocumentoProveedor {
            id_documento: id,
            id_proveedor: 7,
            tipo_documento: tipo.to_string(),
            nombre_original: format!("{tipo}.pdf"),
            ruta_archivo: format!("7/{tipo}.pdf"),
            tipo_mime: "application/pdf".to_string(),
            tamano_bytes: 1024,
            estatus_revision: EstatusDocumento::Pendiente,
            comentario_revision: None,
            fecha_carga: Utc::now(),
            fecha_revision: None,
        }
    }

    #[test]
    fn required_lists_match_fixed_tables() {
        for (tipo, base) in [
            (TipoProveedor::Moral, REQUIRED_DOCS_MORAL),
            (TipoProveedor::Fisica, REQUIRED_DOCS_FISICA),
        ] {
            assert_eq!(documentos_requeridos(tipo, false), base.to_vec());

            let mut esperado = base.to_vec();
            esperado.extend_from_slice(REQUIRED_DOCS_EVENTOS);
            assert_eq!(documentos_requeridos(tipo, true), esperado);
        }
    }

    #[test]
    fn keys_are_unique_within_each_combination() {
        for tipo in TipoProveedor::ALL {
            let claves: Vec<_> = documentos_requeridos(*tipo, true)
                .into_iter()
                .map(|r| r.clave)
                .collect();
            let unicas: HashSet<_> = claves.iter().collect();
            assert_eq!(claves.len(), unicas.len(), "duplicated key for {tipo}");
        }
    }

    #[test]
    fn documento_subido_finds_first_match_only() {
        let docs = vec![subido(1, "CURP"), subido(2, "CONSTANCIA_FISCAL"), subido(3, "CURP")];
        assert_eq!(documento_subido(&docs, "CURP").map(|d| d.id_documento), Some(1));
        assert_eq!(
            documento_subido(&docs, "CONSTANCIA_FISCAL").map(|d| d.id_documento),
            Some(2)
        );
        assert!(documento_subido(&docs, "ACTA_CONSTITUTIVA").is_none());
        assert!(documento_subido(&[], "CURP").is_none());
    }

    #[test]
    fn fisica_eventos_with_one_upload() {
        let docs = vec![subido(10, "CONSTANCIA_FISCAL")];
        let checklist = resolver_checklist("fisica", true, &docs).unwrap();

        assert_eq!(
            checklist.items.len(),
            REQUIRED_DOCS_FISICA.len() + REQUIRED_DOCS_EVENTOS.len()
        );

        let subidos: Vec<_> = checklist
            .items
            .iter()
            .filter(|i| i.estado == EstadoRequisito::Subido)
            .collect();
        assert_eq!(subidos.len(), 1);
        assert_eq!(subidos[0].tipo_documento, "CONSTANCIA_FISCAL");
        assert_eq!(subidos[0].documento.as_ref().map(|d| d.id_documento), Some(10));

        assert_eq!(checklist.pendientes, checklist.items.len() - 1);
        assert!(!checklist.completo);
    }

    #[test]
    fn uploads_outside_the_checklist_are_ignored() {
        // An eventos document does not count for a non-eventos supplier
        let docs = vec![subido(1, "PORTAFOLIO_EVENTOS")];
        let checklist = resolver_checklist("moral", false, &docs).unwrap();
        assert_eq!(checklist.items.len(), REQUIRED_DOCS_MORAL.len());
        assert_eq!(checklist.pendientes, REQUIRED_DOCS_MORAL.len());
    }

    #[test]
    fn complete_when_everything_uploaded() {
        let docs: Vec<_> = REQUIRED_DOCS_MORAL
            .iter()
            .enumerate()
            .map(|(i, r)| subido(i as i32, r.clave))
            .collect();
        let checklist = resolver_checklist("MORAL", false, &docs).unwrap();
        assert!(checklist.completo);
        assert_eq!(checklist.pendientes, 0);
    }

    #[test]
    fn unknown_tipo_is_an_error() {
        let err = resolver_checklist("extranjero", false, &[]).unwrap_err();
        assert_eq!(err, RequisitoError::TipoDesconocido("extranjero".to_string()));
        assert!(err.to_string().contains("extranjero"));
    }

    #[test]
    fn known_keys() {
        assert!(es_clave_conocida("ACTA_CONSTITUTIVA"));
        assert!(es_clave_conocida("POLIZA_RESPONSABILIDAD_CIVIL"));
        assert!(!es_clave_conocida("acta_constitutiva"));
    }
}
