// src/services/arquivo_storage.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;

/// Onde ficam os PDFs das contas da concessionária.
#[async_trait]
pub trait ArquivoStorage: Send + Sync {
    /// Grava o arquivo e devolve o caminho relativo registrado na fatura.
    async fn save(&self, cooperativa_id: Uuid, fatura_id: Uuid, conteudo: &[u8]) -> Result<String, AppError>;

    /// Arquivo ausente não é erro.
    async fn remove(&self, caminho: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct LocalArquivoStorage {
    raiz: PathBuf,
}

impl LocalArquivoStorage {
    pub fn new(raiz: impl Into<PathBuf>) -> Self {
        Self { raiz: raiz.into() }
    }

    fn resolve(&self, caminho: &str) -> Result<PathBuf, AppError> {
        let relativo = Path::new(caminho);
        // só caminhos gerados por `save` (sem `..` nem raiz absoluta)
        if relativo.is_absolute() || relativo.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(AppError::StorageError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("caminho inválido: {}", caminho),
            )));
        }
        Ok(self.raiz.join(relativo))
    }
}

#[async_trait]
impl ArquivoStorage for LocalArquivoStorage {
    async fn save(&self, cooperativa_id: Uuid, fatura_id: Uuid, conteudo: &[u8]) -> Result<String, AppError> {
        let relativo = format!("faturas/{}/{}.pdf", cooperativa_id, fatura_id);
        let destino = self.resolve(&relativo)?;

        if let Some(pasta) = destino.parent() {
            tokio::fs::create_dir_all(pasta).await?;
        }
        tokio::fs::write(&destino, conteudo).await?;

        tracing::debug!(caminho = %relativo, bytes = conteudo.len(), "Arquivo da concessionária gravado");
        Ok(relativo)
    }

    async fn remove(&self, caminho: &str) -> Result<(), AppError> {
        let alvo = self.resolve(caminho)?;
        match tokio::fs::remove_file(&alvo).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(caminho, "Arquivo já não existia");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_remove_twice() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalArquivoStorage::new(dir.path());

        let caminho = storage.save(Uuid::new_v4(), Uuid::new_v4(), b"%PDF-1.4").await.unwrap();
        assert!(dir.path().join(&caminho).exists());

        storage.remove(&caminho).await.unwrap();
        assert!(!dir.path().join(&caminho).exists());
        // segunda remoção: arquivo ausente não é erro
        storage.remove(&caminho).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalArquivoStorage::new(dir.path());
        assert!(storage.remove("../segredo.pdf").await.is_err());
        assert!(storage.remove("/etc/passwd").await.is_err());
    }
}
