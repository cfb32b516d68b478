// src/services/unidade_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{error::AppError, notifier::Notifier},
    db::{CooperadoRepository, TemplateRepository, UnidadeRepository},
    models::{
        auth::Sessao,
        unidade::{FiltroUnidades, UnidadeBeneficiaria, UnidadePayload},
    },
};

#[derive(Clone)]
pub struct UnidadeService {
    unidades: Arc<dyn UnidadeRepository>,
    cooperados: Arc<dyn CooperadoRepository>,
    templates: Arc<dyn TemplateRepository>,
}

impl UnidadeService {
    pub fn new(
        unidades: Arc<dyn UnidadeRepository>,
        cooperados: Arc<dyn CooperadoRepository>,
        templates: Arc<dyn TemplateRepository>,
    ) -> Self {
        Self { unidades, cooperados, templates }
    }

    // Referências precisam existir na mesma cooperativa
    async fn check_refs(&self, sessao: &Sessao, payload: &UnidadePayload) -> Result<(), AppError> {
        if self.cooperados.find_by_id(sessao, payload.cooperado_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(format!("cooperado {}", payload.cooperado_id)));
        }
        if let Some(template_id) = payload.template_calculo_id {
            if self.templates.find_by_id(sessao, template_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("template {}", template_id)));
            }
        }
        Ok(())
    }

    pub async fn create(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        payload: &UnidadePayload,
    ) -> Result<UnidadeBeneficiaria, AppError> {
        self.check_refs(sessao, payload).await?;

        let unidade = self
            .unidades
            .insert(sessao, payload)
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao cadastrar unidade: {}", e)))?;

        tracing::info!(unidade_id = %unidade.id, numero_uc = %unidade.numero_uc, "Unidade beneficiária cadastrada");
        notifier.success(&format!("Unidade {} cadastrada", unidade.numero_uc));
        Ok(unidade)
    }

    pub async fn list(&self, sessao: &Sessao, filtro: &FiltroUnidades) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        self.unidades.list(sessao, filtro).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<UnidadeBeneficiaria, AppError> {
        self.unidades
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("unidade {}", id)))
    }

    pub async fn update(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        payload: &UnidadePayload,
    ) -> Result<UnidadeBeneficiaria, AppError> {
        self.check_refs(sessao, payload).await?;

        let unidade = self
            .unidades
            .update(sessao, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("unidade {}", id)))?;

        notifier.success(&format!("Unidade {} atualizada", unidade.numero_uc));
        Ok(unidade)
    }

    /// Registra a saída; a unidade deixa de entrar na geração mensal.
    pub async fn register_exit(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        data_saida: NaiveDate,
    ) -> Result<UnidadeBeneficiaria, AppError> {
        let atual = self.get(sessao, id).await?;
        if data_saida < atual.data_entrada {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("data_saida");
            err.message = Some("A saída não pode ser anterior à entrada.".into());
            errors.add("dataSaida", err);
            return Err(AppError::ValidationError(errors));
        }

        let unidade = self
            .unidades
            .set_saida(sessao, id, data_saida)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("unidade {}", id)))?;

        tracing::info!(unidade_id = %id, %data_saida, "Saída de unidade registrada");
        notifier.success(&format!("Saída da unidade {} registrada", unidade.numero_uc));
        Ok(unidade)
    }
}
