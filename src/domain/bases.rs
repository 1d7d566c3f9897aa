//! Bidding-base documents attached to a concurso

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum EstatusBases {
        Borrador => "BORRADOR",
        Publicadas => "PUBLICADAS",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bases {
    pub id_bases: i32,
    pub id_concurso: i32,
    pub objeto: String,
    pub requisitos_participacion: String,
    pub criterios_evaluacion: String,
    pub fecha_junta_aclaraciones: Option<DateTime<Utc>>,
    pub fecha_apertura: Option<DateTime<Utc>>,
    pub lugar_entrega: Option<String>,
    pub costo_bases: Option<Decimal>,
    pub version: i32,
    pub estatus: EstatusBases,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrearBasesRequest {
    pub id_concurso: i32,
    pub objeto: String,
    pub requisitos_participacion: String,
    pub criterios_evaluacion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_junta_aclaraciones: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_apertura: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lugar_entrega: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costo_bases: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActualizarBasesRequest {
    pub id_bases: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objeto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisitos_participacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterios_evaluacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_junta_aclaraciones: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_apertura: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lugar_entrega: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costo_bases: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasesIdQuery {
    pub id_bases: i32,
}

fn validar_contenido(
    objeto: &str,
    requisitos_participacion: &str,
    criterios_evaluacion: &str,
    fecha_junta_aclaraciones: Option<DateTime<Utc>>,
    fecha_apertura: Option<DateTime<Utc>>,
) -> Result<(), String> {
    for (campo, valor) in [
        ("objeto", objeto),
        ("requisitos de participación", requisitos_participacion),
        ("criterios de evaluación", criterios_evaluacion),
    ] {
        if valor.trim().is_empty() {
            return Err(format!("El campo {campo} es obligatorio"));
        }
    }
    if let (Some(junta), Some(apertura)) = (fecha_junta_aclaraciones, fecha_apertura) {
        if apertura < junta {
            return Err(
                "La apertura de propuestas debe ser posterior a la junta de aclaraciones"
                    .to_string(),
            );
        }
    }
    Ok(())
}

impl CrearBasesRequest {
    pub fn validar(&self) -> Result<(), String> {
        validar_contenido(
            &self.objeto,
            &self.requisitos_participacion,
            &self.criterios_evaluacion,
            self.fecha_junta_aclaraciones,
            self.fecha_apertura,
        )
    }
}

impl Bases {
    /// Merge an edit into the current draft and re-check it.
    pub fn aplicar(&mut self, cambios: ActualizarBasesRequest) -> Result<(), String> {
        if let Some(v) = cambios.objeto {
            self.objeto = v;
        }
        if let Some(v) = cambios.requisitos_participacion {
            self.requisitos_participacion = v;
        }
        if let Some(v) = cambios.criterios_evaluacion {
            self.criterios_evaluacion = v;
        }
        if cambios.fecha_junta_aclaraciones.is_some() {
            self.fecha_junta_aclaraciones = cambios.fecha_junta_aclaraciones;
        }
        if cambios.fecha_apertura.is_some() {
            self.fecha_apertura = cambios.fecha_apertura;
        }
        if cambios.lugar_entrega.is_some() {
            self.lugar_entrega = cambios.lugar_entrega;
        }
        if cambios.costo_bases.is_some() {
            self.costo_bases = cambios.costo_bases;
        }
        validar_contenido(
            &self.objeto,
            &self.requisitos_participacion,
            &self.criterios_evaluacion,
            self.fecha_junta_aclaraciones,
            self.fecha_apertura,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn solicitud() -> CrearBasesRequest {
        CrearBasesRequest {
            id_concurso: 1,
            objeto: "Adquisición de equipo de cómputo".to_string(),
            requisitos_participacion: "Registro vigente en el padrón".to_string(),
            criterios_evaluacion: "Binario".to_string(),
            fecha_junta_aclaraciones: None,
            fecha_apertura: None,
            lugar_entrega: None,
            costo_bases: None,
        }
    }

    #[test]
    fn required_text_fields() {
        assert!(solicitud().validar().is_ok());
        let mut req = solicitud();
        req.criterios_evaluacion = String::new();
        assert!(req.validar().unwrap_err().contains("criterios"));
    }

    #[test]
    fn apertura_after_junta() {
        let ahora = Utc::now();
        let mut req = solicitud();
        req.fecha_junta_aclaraciones = Some(ahora);
        req.fecha_apertura = Some(ahora - Duration::days(1));
        assert!(req.validar().is_err());
        req.fecha_apertura = Some(ahora + Duration::days(3));
        assert!(req.validar().is_ok());
    }

    #[test]
    fn aplicar_merges_and_revalidates() {
        let ahora = Utc::now();
        let mut bases = Bases {
            id_bases: 7,
            id_concurso: 1,
            objeto: "Objeto".to_string(),
            requisitos_participacion: "Requisitos".to_string(),
            criterios_evaluacion: "Binario".to_string(),
            fecha_junta_aclaraciones: Some(ahora),
            fecha_apertura: None,
            lugar_entrega: None,
            costo_bases: None,
            version: 1,
            estatus: EstatusBases::Borrador,
            created_at: ahora,
            updated_at: ahora,
        };

        let cambios = ActualizarBasesRequest {
            id_bases: 7,
            lugar_entrega: Some("Almacén central".to_string()),
            ..Default::default()
        };
        assert!(bases.aplicar(cambios).is_ok());
        assert_eq!(bases.lugar_entrega.as_deref(), Some("Almacén central"));
        assert_eq!(bases.objeto, "Objeto");

        let cambios = ActualizarBasesRequest {
            id_bases: 7,
            fecha_apertura: Some(ahora - Duration::hours(2)),
            ..Default::default()
        };
        assert!(bases.aplicar(cambios).is_err());
    }
}
