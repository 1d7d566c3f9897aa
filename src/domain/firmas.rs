//! Signature requests sent for a contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contratos::EstatusContrato;

text_enum! {
    pub enum EstatusFirma {
        Enviada => "ENVIADA",
        Firmada => "FIRMADA",
        Rechazada => "RECHAZADA",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Firma {
    pub id_firma: i32,
    pub id_contrato: i32,
    pub firmante_nombre: String,
    pub firmante_correo: String,
    pub estatus: EstatusFirma,
    pub enviada_en: DateTime<Utc>,
    pub firmada_en: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Firmante {
    pub nombre: String,
    pub correo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnviarFirmaRequest {
    pub id_contrato: i32,
    pub firmantes: Vec<Firmante>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespuestaFirmaRequest {
    pub id_firma: i32,
    pub estatus: EstatusFirma,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmasQuery {
    pub id_contrato: i32,
}

/// Contract status implied by the current set of signatures.
pub fn estatus_contrato_por_firmas(firmas: &[EstatusFirma]) -> EstatusContrato {
    if firmas.contains(&EstatusFirma::Rechazada) {
        EstatusContrato::Borrador
    } else if !firmas.is_empty() && firmas.iter().all(|f| *f == EstatusFirma::Firmada) {
        EstatusContrato::Firmado
    } else {
        EstatusContrato::EnviadoFirma
    }
}

impl EnviarFirmaRequest {
    pub fn validar(&self) -> Result<(), String> {
        if self.firmantes.is_empty() {
            return Err("Se requiere al menos un firmante".to_string());
        }
        if let Some(f) = self
            .firmantes
            .iter()
            .find(|f| f.nombre.trim().is_empty() || !f.correo.contains('@'))
        {
            return Err(format!("Firmante inválido: '{}' <{}>", f.nombre, f.correo));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EstatusFirma::*;
    use super::*;

    #[test]
    fn all_signed_means_firmado() {
        assert_eq!(estatus_contrato_por_firmas(&[Firmada, Firmada]), EstatusContrato::Firmado);
    }

    #[test]
    fn any_rejection_returns_to_draft() {
        assert_eq!(
            estatus_contrato_por_firmas(&[Firmada, Rechazada, Enviada]),
            EstatusContrato::Borrador
        );
    }

    #[test]
    fn partial_signatures_stay_sent() {
        assert_eq!(
            estatus_contrato_por_firmas(&[Firmada, Enviada]),
            EstatusContrato::EnviadoFirma
        );
        assert_eq!(estatus_contrato_por_firmas(&[]), EstatusContrato::EnviadoFirma);
    }

    #[test]
    fn signer_validation() {
        let mut req = EnviarFirmaRequest {
            id_contrato: 1,
            firmantes: vec![],
        };
        assert!(req.validar().is_err());
        req.firmantes.push(Firmante {
            nombre: "Laura Díaz".to_string(),
            correo: "laura.diaz".to_string(),
        });
        assert!(req.validar().unwrap_err().contains("laura.diaz"));
        req.firmantes[0].correo = "laura.diaz@saf.gob.mx".to_string();
        assert!(req.validar().is_ok());
    }
}
