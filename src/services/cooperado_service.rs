// src/services/cooperado_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, notifier::Notifier},
    db::{CooperadoRepository, UnidadeRepository},
    models::{
        auth::Sessao,
        cooperado::{Cooperado, CooperadoPayload},
        unidade::{FiltroUnidades, UnidadeBeneficiaria},
    },
};

#[derive(Clone)]
pub struct CooperadoService {
    repo: Arc<dyn CooperadoRepository>,
    unidades: Arc<dyn UnidadeRepository>,
}

impl CooperadoService {
    pub fn new(repo: Arc<dyn CooperadoRepository>, unidades: Arc<dyn UnidadeRepository>) -> Self {
        Self { repo, unidades }
    }

    pub async fn create(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        payload: &CooperadoPayload,
    ) -> Result<Cooperado, AppError> {
        let cooperado = self
            .repo
            .insert(sessao, payload)
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao cadastrar cooperado: {}", e)))?;

        tracing::info!(cooperado_id = %cooperado.id, "Cooperado cadastrado");
        notifier.success(&format!("Cooperado {} cadastrado", cooperado.nome));
        Ok(cooperado)
    }

    pub async fn list(&self, sessao: &Sessao) -> Result<Vec<Cooperado>, AppError> {
        self.repo.list(sessao).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<Cooperado, AppError> {
        self.repo
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("cooperado {}", id)))
    }

    /// Cooperado com suas unidades, para a ficha.
    pub async fn get_with_unidades(
        &self,
        sessao: &Sessao,
        id: Uuid,
    ) -> Result<(Cooperado, Vec<UnidadeBeneficiaria>), AppError> {
        let cooperado = self.get(sessao, id).await?;
        let filtro = FiltroUnidades { cooperado_id: Some(id), ..Default::default() };
        let unidades = self.unidades.list(sessao, &filtro).await?;
        Ok((cooperado, unidades))
    }

    pub async fn update(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        payload: &CooperadoPayload,
    ) -> Result<Cooperado, AppError> {
        let cooperado = self
            .repo
            .update(sessao, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("cooperado {}", id)))?;

        notifier.success(&format!("Cooperado {} atualizado", cooperado.nome));
        Ok(cooperado)
    }

    pub async fn delete(&self, sessao: &Sessao, notifier: &dyn Notifier, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete(sessao, id).await? {
            return Err(AppError::ResourceNotFound(format!("cooperado {}", id)));
        }
        tracing::info!(cooperado_id = %id, "Cooperado excluído");
        notifier.success("Cooperado excluído");
        Ok(())
    }
}
