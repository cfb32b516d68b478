// src/services/lancamento_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError, notifier::Notifier},
    db::LancamentoRepository,
    models::{
        auth::Sessao,
        historico::HistoricoLancamento,
        lancamento::{
            CreateLancamentoPayload, FiltroLancamentos, LancamentoFinanceiro, NovoLancamento, PagamentoInfo,
        },
        status::StatusLancamento,
    },
};

#[derive(Clone)]
pub struct LancamentoService {
    repo: Arc<dyn LancamentoRepository>,
    clock: Arc<dyn Clock>,
}

impl LancamentoService {
    pub fn new(repo: Arc<dyn LancamentoRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        payload: &CreateLancamentoPayload,
    ) -> Result<LancamentoFinanceiro, AppError> {
        let novo = NovoLancamento {
            tipo: payload.tipo,
            descricao: payload.descricao.trim().to_string(),
            valor: payload.valor,
            data_vencimento: payload.data_vencimento,
            fatura_id: None,
            pagamento_usina_id: None,
            cooperado_id: payload.cooperado_id,
            observacao: payload.observacao.clone(),
        };

        let lancamento = self.repo.insert(sessao, &novo).await?;
        tracing::info!(lancamento_id = %lancamento.id, tipo = ?lancamento.tipo, "Lançamento criado");
        notifier.success("Lançamento criado");
        Ok(lancamento)
    }

    pub async fn list(
        &self,
        sessao: &Sessao,
        filtro: &FiltroLancamentos,
    ) -> Result<Vec<LancamentoFinanceiro>, AppError> {
        self.repo.list(sessao, filtro).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<LancamentoFinanceiro, AppError> {
        self.repo
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("lançamento {}", id)))
    }

    pub async fn historico(&self, sessao: &Sessao, id: Uuid) -> Result<Vec<HistoricoLancamento>, AppError> {
        Ok(self.get(sessao, id).await?.historico_status.most_recent_first())
    }

    /// Transição simples, sem dados de pagamento.
    pub async fn transition_status(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        novo_status: StatusLancamento,
        observacao: Option<String>,
    ) -> Result<LancamentoFinanceiro, AppError> {
        self.apply(sessao, notifier, id, novo_status, observacao, None).await
    }

    /// Fluxo "registrar pagamento": vai para `pago` com valor, juros e desconto.
    pub async fn register_payment(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        pagamento: PagamentoInfo,
    ) -> Result<LancamentoFinanceiro, AppError> {
        self.apply(sessao, notifier, id, StatusLancamento::Pago, None, Some(pagamento))
            .await
    }

    async fn apply(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        novo_status: StatusLancamento,
        observacao: Option<String>,
        pagamento: Option<PagamentoInfo>,
    ) -> Result<LancamentoFinanceiro, AppError> {
        let lancamento = self.get(sessao, id).await?;

        let update = lancamento
            .plan_transition(novo_status, observacao, pagamento, self.clock.now())
            .inspect_err(|e| notifier.error(&e.to_string()))?;

        let atualizado = self
            .repo
            .update_status(sessao, &update)
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao atualizar status: {}", e)))?;

        tracing::info!(
            lancamento_id = %id,
            de = %update.status_anterior,
            para = %novo_status,
            "Status do lançamento alterado"
        );
        notifier.success(&format!("Status alterado para {}", novo_status));
        Ok(atualizado)
    }

    pub async fn delete(&self, sessao: &Sessao, notifier: &dyn Notifier, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete(sessao, id).await? {
            return Err(AppError::ResourceNotFound(format!("lançamento {}", id)));
        }
        tracing::info!(lancamento_id = %id, "Lançamento excluído");
        notifier.success("Lançamento excluído");
        Ok(())
    }
}
