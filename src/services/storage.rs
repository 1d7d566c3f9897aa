//! Local file storage for uploaded supplier documents.

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DocumentStorage {
    root: PathBuf,
}

/// Keep only characters safe in a file name; the rest become `_`.
pub fn nombre_seguro(nombre: &str) -> String {
    let base = Path::new(nombre)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let limpio: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    let limpio = limpio.trim_start_matches('.').to_string();
    if limpio.is_empty() {
        "documento".to_string()
    } else {
        limpio
    }
}

impl DocumentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store `contenido` and return the path relative to the storage root.
    pub async fn guardar(
        &self,
        id_proveedor: i32,
        tipo_documento: &str,
        nombre_original: &str,
        contenido: &[u8],
    ) -> Result<String> {
        let relativa = format!(
            "{id_proveedor}/{}_{}_{}",
            nombre_seguro(tipo_documento),
            Uuid::new_v4().simple(),
            nombre_seguro(nombre_original)
        );
        let destino = self.ruta_absoluta(&relativa)?;

        if let Some(dir) = destino.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        tokio::fs::write(&destino, contenido)
            .await
            .with_context(|| format!("Failed to write {}", destino.display()))?;

        tracing::debug!(ruta = %relativa, bytes = contenido.len(), "Document stored");
        Ok(relativa)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn eliminar(&self, relativa: &str) -> Result<()> {
        let ruta = self.ruta_absoluta(relativa)?;
        match tokio::fs::remove_file(&ruta).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(ruta = %relativa, "Stored document already missing");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", ruta.display())),
        }
    }

    /// Resolve a stored relative path, refusing anything that escapes the root.
    pub fn ruta_absoluta(&self, relativa: &str) -> Result<PathBuf> {
        let path = Path::new(relativa);
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Invalid stored document path: {relativa}");
        }
        Ok(self.root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(nombre_seguro("acta constitutiva.pdf"), "acta_constitutiva.pdf");
        assert_eq!(nombre_seguro("../../etc/passwd"), "passwd");
        assert_eq!(nombre_seguro("..."), "documento");
        assert_eq!(nombre_seguro("póliza.PDF"), "p_liza.PDF");
    }

    #[test]
    fn rejects_paths_outside_root() {
        let storage = DocumentStorage::new("/srv/uploads");
        assert!(storage.ruta_absoluta("3/archivo.pdf").is_ok());
        assert!(storage.ruta_absoluta("../3/archivo.pdf").is_err());
        assert!(storage.ruta_absoluta("/etc/passwd").is_err());
    }

    #[tokio::test]
    async fn stores_and_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path());

        let relativa = storage
            .guardar(7, "CURP", "mi curp.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(relativa.starts_with("7/CURP_"));
        assert!(relativa.ends_with("_mi_curp.pdf"));

        let absoluta = storage.ruta_absoluta(&relativa).unwrap();
        assert_eq!(std::fs::read(&absoluta).unwrap(), b"%PDF-1.4");

        storage.eliminar(&relativa).await.unwrap();
        assert!(!absoluta.exists());
        // Deleting twice is fine
        storage.eliminar(&relativa).await.unwrap();
    }
}
