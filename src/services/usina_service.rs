// src/services/usina_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, notifier::Notifier},
    db::{LancamentoRepository, NovoPagamentoUsina, UnidadeRepository, UsinaRepository},
    models::{
        auth::Sessao,
        lancamento::{NovoLancamento, TipoLancamento},
        periodo::Periodo,
        unidade::UnidadeBeneficiaria,
        usina::{PagamentoUsina, PagamentoUsinaPayload, RateioPayload, Usina, UsinaPayload},
    },
};

#[derive(Clone)]
pub struct UsinaService {
    usinas: Arc<dyn UsinaRepository>,
    unidades: Arc<dyn UnidadeRepository>,
    lancamentos: Arc<dyn LancamentoRepository>,
}

impl UsinaService {
    pub fn new(
        usinas: Arc<dyn UsinaRepository>,
        unidades: Arc<dyn UnidadeRepository>,
        lancamentos: Arc<dyn LancamentoRepository>,
    ) -> Self {
        Self { usinas, unidades, lancamentos }
    }

    pub async fn create(&self, sessao: &Sessao, notifier: &dyn Notifier, payload: &UsinaPayload) -> Result<Usina, AppError> {
        let usina = self.usinas.insert(sessao, payload).await?;
        tracing::info!(usina_id = %usina.id, "Usina cadastrada");
        notifier.success(&format!("Usina {} cadastrada", usina.nome));
        Ok(usina)
    }

    pub async fn list(&self, sessao: &Sessao) -> Result<Vec<Usina>, AppError> {
        self.usinas.list(sessao).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<Usina, AppError> {
        self.usinas
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("usina {}", id)))
    }

    pub async fn update(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        payload: &UsinaPayload,
    ) -> Result<Usina, AppError> {
        let usina = self
            .usinas
            .update(sessao, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("usina {}", id)))?;
        notifier.success(&format!("Usina {} atualizada", usina.nome));
        Ok(usina)
    }

    /// Substitui o rateio inteiro da usina.
    pub async fn set_rateio(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        usina_id: Uuid,
        payload: &RateioPayload,
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        payload
            .ensure_consistent()
            .inspect_err(|e| notifier.error(&e.to_string()))?;
        self.get(sessao, usina_id).await?;

        let unidades = self.unidades.replace_rateio(sessao, usina_id, &payload.itens).await?;
        tracing::info!(%usina_id, unidades = unidades.len(), "Rateio atualizado");
        notifier.success("Rateio atualizado");
        Ok(unidades)
    }

    /// Registra o pagamento mensal ao investidor e a despesa correspondente.
    pub async fn create_pagamento(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        usina_id: Uuid,
        payload: &PagamentoUsinaPayload,
    ) -> Result<PagamentoUsina, AppError> {
        let usina = self.get(sessao, usina_id).await?;
        let periodo = Periodo::new(payload.mes, payload.ano)?;

        // sem valor informado: geração x tarifa da usina
        let valor_total = payload
            .valor_total
            .unwrap_or(payload.geracao_kwh * usina.valor_kwh)
            .round_dp(2);

        let pagamento = self
            .usinas
            .insert_pagamento(
                sessao,
                &NovoPagamentoUsina {
                    usina_id,
                    periodo,
                    geracao_kwh: payload.geracao_kwh,
                    valor_total,
                    data_vencimento: payload.data_vencimento,
                },
            )
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao registrar pagamento: {}", e)))?;

        let despesa = NovoLancamento {
            tipo: TipoLancamento::Despesa,
            descricao: format!("Pagamento usina {} {:02}/{}", usina.nome, periodo.mes, periodo.ano),
            valor: valor_total,
            data_vencimento: payload.data_vencimento,
            fatura_id: None,
            pagamento_usina_id: Some(pagamento.id),
            cooperado_id: None,
            observacao: None,
        };
        if let Err(e) = self.lancamentos.insert(sessao, &despesa).await {
            tracing::warn!(pagamento_id = %pagamento.id, "Falha ao criar despesa do pagamento: {:?}", e);
            notifier.warn("Pagamento registrado, mas a despesa não foi lançada");
        }

        notifier.success(&format!("Pagamento de {:02}/{} registrado", periodo.mes, periodo.ano));
        Ok(pagamento)
    }

    pub async fn list_pagamentos(&self, sessao: &Sessao, usina_id: Uuid) -> Result<Vec<PagamentoUsina>, AppError> {
        self.get(sessao, usina_id).await?;
        self.usinas.list_pagamentos(sessao, usina_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::notifier::{NivelNotificacao, RecordingNotifier};
    use crate::db::memory::MemoryStore;
    use crate::models::lancamento::FiltroLancamentos;
    use crate::models::unidade::fixtures::unidade;
    use crate::models::usina::RateioItem;
    use crate::test_utils::{d, payload_usina, sessao};
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryStore>, UsinaService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), UsinaService::new(store.clone(), store.clone(), store))
    }

    #[tokio::test]
    async fn rateio_over_one_hundred_is_rejected_without_writes() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let usina = svc.create(&s, &n, &payload_usina()).await.unwrap();
        let a = unidade(s.cooperativa_id, d(2024, 1, 1));
        let b = unidade(s.cooperativa_id, d(2024, 1, 1));
        let itens = vec![
            RateioItem { unidade_beneficiaria_id: a.id, percentual: Decimal::new(70, 0) },
            RateioItem { unidade_beneficiaria_id: b.id, percentual: Decimal::new(31, 0) },
        ];
        store.add_unidade(a);
        store.add_unidade(b);

        let err = svc.set_rateio(&s, &n, usina.id, &RateioPayload { itens }).await.unwrap_err();
        assert!(matches!(err, AppError::RateioExceeded(_)));
        assert!(store.unidades.lock().unwrap().iter().all(|u| u.usina_id.is_none()));
        assert_eq!(n.count(NivelNotificacao::Erro), 1);
    }

    #[tokio::test]
    async fn rateio_replaces_previous_allocation() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let usina = svc.create(&s, &n, &payload_usina()).await.unwrap();
        let a = unidade(s.cooperativa_id, d(2024, 1, 1));
        let b = unidade(s.cooperativa_id, d(2024, 1, 1));
        let (a_id, b_id) = (a.id, b.id);
        store.add_unidade(a);
        store.add_unidade(b);

        let primeiro = RateioPayload {
            itens: vec![RateioItem { unidade_beneficiaria_id: a_id, percentual: Decimal::new(100, 0) }],
        };
        svc.set_rateio(&s, &n, usina.id, &primeiro).await.unwrap();

        let segundo = RateioPayload {
            itens: vec![RateioItem { unidade_beneficiaria_id: b_id, percentual: Decimal::new(60, 0) }],
        };
        let alocadas = svc.set_rateio(&s, &n, usina.id, &segundo).await.unwrap();
        assert_eq!(alocadas.len(), 1);
        assert_eq!(alocadas[0].id, b_id);
        assert_eq!(alocadas[0].percentual_rateio, Some(Decimal::new(60, 0)));
    }

    #[tokio::test]
    async fn plant_payment_creates_expense_entry() {
        let (store, svc) = service();
        let s = sessao();
        let n = RecordingNotifier::default();
        let usina = svc.create(&s, &n, &payload_usina()).await.unwrap();

        let payload = PagamentoUsinaPayload {
            mes: 3,
            ano: 2024,
            geracao_kwh: Decimal::new(9800, 0),
            valor_total: None,
            data_vencimento: d(2024, 4, 15),
        };
        let pagamento = svc.create_pagamento(&s, &n, usina.id, &payload).await.unwrap();
        // 9800 kWh x 0,45
        assert_eq!(pagamento.valor_total, Decimal::new(441000, 2));

        let despesas = LancamentoRepository::list(store.as_ref(), &s, &FiltroLancamentos::default())
            .await
            .unwrap();
        assert_eq!(despesas.len(), 1);
        assert_eq!(despesas[0].tipo, TipoLancamento::Despesa);
        assert_eq!(despesas[0].pagamento_usina_id, Some(pagamento.id));
        assert_eq!(despesas[0].valor, pagamento.valor_total);

        let repetido = svc.create_pagamento(&s, &n, usina.id, &payload).await.unwrap_err();
        assert!(matches!(repetido, AppError::UniqueConstraintViolation(_)));
        assert_eq!(svc.list_pagamentos(&s, usina.id).await.unwrap().len(), 1);
    }
}
