// src/services/template_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, notifier::Notifier},
    db::TemplateRepository,
    models::{
        auth::Sessao,
        template::{TemplateCalculo, TemplatePayload, VariaveisDisponiveis},
    },
    services::formula::{Formula, Variavel},
};

#[derive(Clone)]
pub struct TemplateService {
    repo: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    pub fn new(repo: Arc<dyn TemplateRepository>) -> Self {
        Self { repo }
    }

    // Fórmula inválida nunca chega ao banco
    fn validate_formulas(payload: &TemplatePayload) -> Result<(), AppError> {
        Formula::parse_desconto(&payload.formula_desconto)?;
        Formula::parse(&payload.formula_assinatura)?;
        Ok(())
    }

    pub fn variables() -> VariaveisDisponiveis {
        VariaveisDisponiveis {
            variaveis: Variavel::TODAS.iter().map(|v| v.nome()).collect(),
        }
    }

    pub async fn list(&self, sessao: &Sessao) -> Result<Vec<TemplateCalculo>, AppError> {
        self.repo.list(sessao).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<TemplateCalculo, AppError> {
        self.repo
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("template {}", id)))
    }

    pub async fn get_default(&self, sessao: &Sessao) -> Result<TemplateCalculo, AppError> {
        self.repo.get_default(sessao).await?.ok_or(AppError::TemplateNotConfigured)
    }

    /// Template escolhido na unidade ou, sem escolha, o padrão da cooperativa.
    pub async fn resolve_for(&self, sessao: &Sessao, template_id: Option<Uuid>) -> Result<TemplateCalculo, AppError> {
        match template_id {
            Some(id) => self.get(sessao, id).await,
            None => self.get_default(sessao).await,
        }
    }

    pub async fn create(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        payload: &TemplatePayload,
    ) -> Result<TemplateCalculo, AppError> {
        Self::validate_formulas(payload)?;

        let template = self.repo.insert(sessao, payload).await?;
        tracing::info!(template_id = %template.id, padrao = template.is_padrao, "Template de cálculo criado");
        notifier.success(&format!("Template \"{}\" criado", template.nome));
        Ok(template)
    }

    pub async fn update(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        payload: &TemplatePayload,
    ) -> Result<TemplateCalculo, AppError> {
        Self::validate_formulas(payload)?;

        let template = self
            .repo
            .update(sessao, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("template {}", id)))?;

        tracing::info!(template_id = %id, padrao = template.is_padrao, "Template de cálculo atualizado");
        notifier.success(&format!("Template \"{}\" atualizado", template.nome));
        Ok(template)
    }

    pub async fn reset_default_templates(&self, sessao: &Sessao, except_id: Option<Uuid>) -> Result<u64, AppError> {
        let rebaixados = self.repo.reset_default_templates(sessao, except_id).await?;
        tracing::debug!(rebaixados, "Templates padrão redefinidos");
        Ok(rebaixados)
    }

    pub async fn delete(&self, sessao: &Sessao, notifier: &dyn Notifier, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(sessao, id).await {
            Ok(true) => {}
            Ok(false) => return Err(AppError::ResourceNotFound(format!("template {}", id))),
            Err(AppError::TemplateInUse(_)) => {
                notifier.error("Template em uso por unidades beneficiárias não pode ser excluído");
                return Err(AppError::TemplateInUse(id));
            }
            Err(e) => return Err(e),
        }

        tracing::info!(template_id = %id, "Template de cálculo excluído");
        notifier.success("Template excluído");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::notifier::{NivelNotificacao, RecordingNotifier};
    use crate::db::memory::MemoryStore;
    use crate::db::TemplateRepository;
    use crate::models::unidade::fixtures::unidade;
    use crate::test_utils::{payload_template, sessao};
    use chrono::NaiveDate;

    fn service() -> (Arc<MemoryStore>, TemplateService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), TemplateService::new(store))
    }

    #[tokio::test]
    async fn at_most_one_default_after_each_save() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();

        let a = svc.create(&s, &n, &payload_template("A", true)).await.unwrap();
        let b = svc.create(&s, &n, &payload_template("B", true)).await.unwrap();

        let padroes: Vec<_> = store.list(&s).await.unwrap().into_iter().filter(|t| t.is_padrao).collect();
        assert_eq!(padroes.len(), 1);
        assert_eq!(padroes[0].id, b.id);

        svc.update(&s, &n, a.id, &payload_template("A", true)).await.unwrap();
        let padrao = svc.get_default(&s).await.unwrap();
        assert_eq!(padrao.id, a.id);
        assert_eq!(store.list(&s).await.unwrap().iter().filter(|t| t.is_padrao).count(), 1);
    }

    #[tokio::test]
    async fn reset_keeps_only_the_exception() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let a = svc.create(&s, &n, &payload_template("A", true)).await.unwrap();

        assert_eq!(svc.reset_default_templates(&s, Some(a.id)).await.unwrap(), 0);
        assert_eq!(svc.reset_default_templates(&s, None).await.unwrap(), 1);
        assert!(store.list(&s).await.unwrap().iter().all(|t| !t.is_padrao));
    }

    #[tokio::test]
    async fn invalid_formula_is_rejected_before_saving() {
        let (store, svc) = service();
        let s = sessao();
        let mut payload = payload_template("Quebrado", false);
        payload.formula_assinatura = "total_fatura - tarifa".into();

        let err = svc.create(&s, &RecordingNotifier::default(), &payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormula(_)));
        assert!(store.list(&s).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_refused_while_referenced() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let t = svc.create(&s, &n, &payload_template("Em uso", false)).await.unwrap();

        let mut u = unidade(s.cooperativa_id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        u.template_calculo_id = Some(t.id);
        store.add_unidade(u);

        let err = svc.delete(&s, &n, t.id).await.unwrap_err();
        assert!(matches!(err, AppError::TemplateInUse(id) if id == t.id));
        assert!(svc.get(&s, t.id).await.is_ok());
        assert_eq!(n.count(NivelNotificacao::Erro), 1);
    }

    #[tokio::test]
    async fn store_refuses_delete_of_referenced_template() {
        let (store, svc) = service();
        let s = sessao();
        let t = svc
            .create(&s, &RecordingNotifier::default(), &payload_template("Vinculado", false))
            .await
            .unwrap();

        let mut u = unidade(s.cooperativa_id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        u.template_calculo_id = Some(t.id);
        store.add_unidade(u);

        let err = TemplateRepository::delete(store.as_ref(), &s, t.id).await.unwrap_err();
        assert!(matches!(err, AppError::TemplateInUse(id) if id == t.id));
        assert_eq!(store.list(&s).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_succeeds_without_references() {
        let (_store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let t = svc.create(&s, &n, &payload_template("Livre", false)).await.unwrap();

        svc.delete(&s, &n, t.id).await.unwrap();
        assert!(matches!(svc.get(&s, t.id).await, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn no_default_means_not_configured() {
        let (_store, svc) = service();
        assert!(matches!(
            svc.resolve_for(&sessao(), None).await,
            Err(AppError::TemplateNotConfigured)
        ));
    }

    #[test]
    fn exposes_the_six_variables() {
        let vars = TemplateService::variables().variaveis;
        assert_eq!(vars.len(), 6);
        assert!(vars.contains(&"percentual_desconto"));
    }
}
