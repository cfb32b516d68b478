// src/services/fatura_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError, notifier::Notifier},
    db::{FaturaRepository, LancamentoRepository, UnidadeRepository},
    models::{
        auth::Sessao,
        fatura::{
            DadosCalculados, DadosFaturaPayload, Fatura, FiltroFaturas, GeracaoResultado, NovaFatura,
            VerificacaoAtrasoResultado,
        },
        historico::HistoricoFatura,
        lancamento::{NovoLancamento, TipoLancamento},
        periodo::Periodo,
        status::{StatusFatura, StatusLancamento, StatusLifecycle},
    },
    services::{
        arquivo_storage::ArquivoStorage,
        formula::{self, VariaveisCalculo},
        template_service::TemplateService,
    },
};

/// Dia de vencimento da receita quando a fatura não informa vencimento.
const DIA_VENCIMENTO_PADRAO: u32 = 10;

#[derive(Clone)]
pub struct FaturaService {
    faturas: Arc<dyn FaturaRepository>,
    lancamentos: Arc<dyn LancamentoRepository>,
    unidades: Arc<dyn UnidadeRepository>,
    templates: TemplateService,
    storage: Arc<dyn ArquivoStorage>,
    clock: Arc<dyn Clock>,
}

impl FaturaService {
    pub fn new(
        faturas: Arc<dyn FaturaRepository>,
        lancamentos: Arc<dyn LancamentoRepository>,
        unidades: Arc<dyn UnidadeRepository>,
        templates: TemplateService,
        storage: Arc<dyn ArquivoStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { faturas, lancamentos, unidades, templates, storage, clock }
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list(&self, sessao: &Sessao, filtro: &FiltroFaturas) -> Result<Vec<Fatura>, AppError> {
        self.faturas.list(sessao, filtro).await
    }

    pub async fn get(&self, sessao: &Sessao, id: Uuid) -> Result<Fatura, AppError> {
        self.faturas
            .find_by_id(sessao, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("fatura {}", id)))
    }

    /// Histórico para exibição, mais recente primeiro.
    pub async fn historico(&self, sessao: &Sessao, id: Uuid) -> Result<Vec<HistoricoFatura>, AppError> {
        Ok(self.get(sessao, id).await?.historico_status.most_recent_first())
    }

    // =========================================================================
    //  GERAÇÃO MENSAL
    // =========================================================================

    pub async fn generate_for_period(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        mes: u32,
        ano: i32,
    ) -> Result<GeracaoResultado, AppError> {
        let periodo = Periodo::new(mes, ano)?;

        if periodo.is_future(self.clock.today()) {
            notifier.error(&format!("Não é possível gerar faturas para {:02}/{}: período futuro", mes, ano));
            return Err(AppError::FuturePeriod { mes, ano });
        }

        // Única falha que aborta a execução inteira
        let candidatas = self
            .unidades
            .list_active_entered_by(sessao, periodo.last_day())
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao buscar unidades: {}", e)))?;

        let mut resultado = GeracaoResultado::default();

        for unidade in candidatas.iter().filter(|u| u.is_eligible_for(&periodo)) {
            match self.generate_one(sessao, unidade.id, periodo).await {
                Ok(true) => resultado.gerados += 1,
                Ok(false) => resultado.ignorados += 1,
                Err(e) => {
                    tracing::error!(unidade_id = %unidade.id, "Falha ao gerar fatura: {:?}", e);
                    resultado.erros += 1;
                    resultado.log_erros.push(format!("UC {}: {}", unidade.numero_uc, e));
                }
            }
        }

        tracing::info!(
            mes,
            ano,
            gerados = resultado.gerados,
            ignorados = resultado.ignorados,
            erros = resultado.erros,
            "Geração de faturas concluída"
        );

        if resultado.erros > 0 {
            notifier.warn(&format!(
                "{} fatura(s) gerada(s), {} erro(s) em {:02}/{}",
                resultado.gerados, resultado.erros, mes, ano
            ));
        } else {
            notifier.success(&format!("{} fatura(s) gerada(s) para {:02}/{}", resultado.gerados, mes, ano));
        }

        Ok(resultado)
    }

    /// `Ok(false)` quando a unidade já tem fatura no período.
    async fn generate_one(&self, sessao: &Sessao, unidade_id: Uuid, periodo: Periodo) -> Result<bool, AppError> {
        if self.faturas.exists_for_period(sessao, unidade_id, periodo).await? {
            return Ok(false);
        }

        let nova = NovaFatura::pendente(unidade_id, periodo, self.clock.now())?;
        match self.faturas.insert(sessao, &nova).await {
            Ok(_) => Ok(true),
            // corrida com outra geração: o índice único decide
            Err(AppError::UniqueConstraintViolation(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    pub async fn transition_status(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        novo_status: StatusFatura,
        observacao: Option<String>,
    ) -> Result<Fatura, AppError> {
        let fatura = self.get(sessao, id).await?;

        let update = fatura
            .plan_transition(novo_status, observacao, self.clock.now())
            .inspect_err(|e| notifier.error(&e.to_string()))?;

        let atualizada = self
            .faturas
            .update_status(sessao, &update)
            .await
            .inspect_err(|e| notifier.error(&format!("Erro ao atualizar status: {}", e)))?;

        tracing::info!(
            fatura_id = %id,
            de = %update.status_anterior,
            para = %novo_status,
            "Status da fatura alterado"
        );

        match novo_status {
            StatusFatura::Enviada | StatusFatura::Reenviada => {
                if let Err(e) = self.ensure_receita(sessao, &atualizada).await {
                    tracing::warn!(fatura_id = %id, "Falha ao criar lançamento da fatura: {:?}", e);
                    notifier.warn("Status alterado, mas o lançamento financeiro não foi criado");
                }
            }
            StatusFatura::Paga => {
                if let Err(e) = self.settle_receita(sessao, &atualizada).await {
                    tracing::warn!(fatura_id = %id, "Falha ao baixar lançamento da fatura: {:?}", e);
                    notifier.warn("Status alterado, mas o lançamento financeiro não foi baixado");
                }
            }
            _ => {}
        }

        notifier.success(&format!("Status alterado para {}", novo_status));
        Ok(atualizada)
    }

    /// Cria a receita da fatura, se ainda não existir.
    async fn ensure_receita(&self, sessao: &Sessao, fatura: &Fatura) -> Result<(), AppError> {
        if self.lancamentos.find_by_fatura(sessao, fatura.id).await?.is_some() {
            return Ok(());
        }

        let unidade = self
            .unidades
            .find_by_id(sessao, fatura.unidade_beneficiaria_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("unidade {}", fatura.unidade_beneficiaria_id)))?;

        let periodo = fatura.periodo()?;
        let vencimento = match fatura.data_vencimento {
            Some(data) => data,
            None => {
                let seguinte = periodo.next();
                NaiveDate::from_ymd_opt(seguinte.ano, seguinte.mes, DIA_VENCIMENTO_PADRAO)
                    .ok_or(AppError::InvalidPeriod { mes: seguinte.mes, ano: seguinte.ano })?
            }
        };

        let novo = NovoLancamento {
            tipo: TipoLancamento::Receita,
            descricao: format!("Fatura {:02}/{} - UC {}", periodo.mes, periodo.ano, unidade.numero_uc),
            valor: fatura.valor_assinatura,
            data_vencimento: vencimento,
            fatura_id: Some(fatura.id),
            pagamento_usina_id: None,
            cooperado_id: Some(unidade.cooperado_id),
            observacao: None,
        };
        let lancamento = self.lancamentos.insert(sessao, &novo).await?;
        tracing::info!(fatura_id = %fatura.id, lancamento_id = %lancamento.id, "Receita da fatura criada");
        Ok(())
    }

    /// Fatura paga: a receita vinculada vai para `pago` quando a tabela permite.
    async fn settle_receita(&self, sessao: &Sessao, fatura: &Fatura) -> Result<(), AppError> {
        let Some(lancamento) = self.lancamentos.find_by_fatura(sessao, fatura.id).await? else {
            return Ok(());
        };

        if !lancamento.status.can_transition_to(StatusLancamento::Pago) {
            tracing::debug!(lancamento_id = %lancamento.id, status = %lancamento.status, "Receita não baixada");
            return Ok(());
        }

        let update = lancamento.plan_transition(
            StatusLancamento::Pago,
            Some("Fatura paga".to_string()),
            None,
            self.clock.now(),
        )?;
        self.lancamentos.update_status(sessao, &update).await?;
        Ok(())
    }

    // =========================================================================
    //  DADOS DA CONTA
    // =========================================================================

    pub async fn update_dados(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        payload: &DadosFaturaPayload,
    ) -> Result<Fatura, AppError> {
        let fatura = self.get(sessao, id).await?;

        if !fatura.status.accepts_data_entry() {
            notifier.error(&format!("Fatura em status {} não aceita alteração de dados", fatura.status));
            return Err(AppError::DataEntryLocked(fatura.status.to_string()));
        }
        if payload.versao != fatura.versao {
            return Err(AppError::Conflict);
        }

        let unidade = self
            .unidades
            .find_by_id(sessao, fatura.unidade_beneficiaria_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("unidade {}", fatura.unidade_beneficiaria_id)))?;

        let template = self.templates.resolve_for(sessao, unidade.template_calculo_id).await?;

        let calculo = formula::calcular(
            &template.formula_desconto,
            &template.formula_assinatura,
            VariaveisCalculo {
                total_fatura: payload.total_fatura,
                iluminacao_publica: payload.iluminacao_publica,
                outros_valores: payload.outros_valores,
                fatura_concessionaria: payload.fatura_concessionaria,
                valor_desconto: Decimal::ZERO,
                percentual_desconto: unidade.percentual_desconto,
            },
        )
        .inspect_err(|e| notifier.error(&format!("Erro no template \"{}\": {}", template.nome, e)))?;

        let economia_anterior = self
            .faturas
            .sum_economia_before(sessao, unidade.id, fatura.periodo()?)
            .await?;

        let dados = DadosCalculados {
            id,
            versao_esperada: payload.versao,
            consumo_kwh: payload.consumo_kwh,
            total_fatura: payload.total_fatura,
            iluminacao_publica: payload.iluminacao_publica,
            outros_valores: payload.outros_valores,
            fatura_concessionaria: payload.fatura_concessionaria,
            saldo_energia_kwh: payload.saldo_energia_kwh,
            data_vencimento: payload.data_vencimento,
            valor_desconto: calculo.valor_desconto,
            valor_assinatura: calculo.valor_assinatura,
            economia_mes: calculo.valor_desconto,
            economia_acumulada: economia_anterior + calculo.valor_desconto,
        };

        let atualizada = self.faturas.update_dados(sessao, &dados).await?;
        tracing::info!(fatura_id = %id, template_id = %template.id, "Dados da fatura calculados");
        notifier.success("Dados da fatura salvos");
        Ok(atualizada)
    }

    // =========================================================================
    //  ARQUIVO E EXCLUSÃO
    // =========================================================================

    pub async fn upload_arquivo(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
        id: Uuid,
        conteudo: &[u8],
    ) -> Result<Fatura, AppError> {
        if !conteudo.starts_with(b"%PDF") {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("pdf");
            err.message = Some("O arquivo deve ser um PDF.".into());
            errors.add("arquivo", err);
            return Err(AppError::ValidationError(errors));
        }

        let fatura = self.get(sessao, id).await?;
        let caminho = self.storage.save(sessao.cooperativa_id, fatura.id, conteudo).await?;
        let atualizada = self.faturas.set_arquivo(sessao, id, &caminho).await?;

        notifier.success("Arquivo da concessionária anexado");
        Ok(atualizada)
    }

    pub async fn delete(&self, sessao: &Sessao, notifier: &dyn Notifier, id: Uuid) -> Result<(), AppError> {
        let fatura = self.get(sessao, id).await?;

        let arquivo = self.faturas.delete(sessao, id).await?;
        if let Some(caminho) = arquivo {
            // a fatura já saiu do banco; o arquivo órfão só é registrado
            if let Err(e) = self.storage.remove(&caminho).await {
                tracing::warn!(fatura_id = %id, caminho, "Falha ao remover arquivo: {:?}", e);
            }
        }

        tracing::info!(fatura_id = %id, mes = fatura.mes, ano = fatura.ano, "Fatura excluída");
        notifier.success("Fatura excluída");
        Ok(())
    }

    // =========================================================================
    //  VERIFICAÇÃO DE ATRASOS
    // =========================================================================

    /// Marca faturas e lançamentos vencidos. Só roda quando o operador pede.
    pub async fn mark_overdue(
        &self,
        sessao: &Sessao,
        notifier: &dyn Notifier,
    ) -> Result<VerificacaoAtrasoResultado, AppError> {
        let hoje = self.clock.today();
        let agora = self.clock.now();
        let mut resultado = VerificacaoAtrasoResultado::default();

        for fatura in self.faturas.list_overdue(sessao, hoje).await? {
            let nota = fatura
                .data_vencimento
                .map(|v| format!("Vencida em {}", v.format("%d/%m/%Y")));
            let aplicado = match fatura.plan_transition(StatusFatura::Atrasada, nota, agora) {
                Ok(update) => self.faturas.update_status(sessao, &update).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match aplicado {
                Ok(()) => resultado.faturas_atrasadas += 1,
                Err(e) => resultado.log_erros.push(format!("fatura {}: {}", fatura.id, e)),
            }
        }

        for lancamento in self.lancamentos.list_overdue(sessao, hoje).await? {
            let Some(plano) = lancamento.plan_overdue(hoje, agora) else {
                continue;
            };
            let aplicado = match plano {
                Ok(update) => self.lancamentos.update_status(sessao, &update).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match aplicado {
                Ok(()) => resultado.lancamentos_atrasados += 1,
                Err(e) => resultado.log_erros.push(format!("lançamento {}: {}", lancamento.id, e)),
            }
        }

        tracing::info!(
            faturas = resultado.faturas_atrasadas,
            lancamentos = resultado.lancamentos_atrasados,
            erros = resultado.log_erros.len(),
            "Verificação de atrasos concluída"
        );
        notifier.success(&format!(
            "{} fatura(s) e {} lançamento(s) marcados como atrasados",
            resultado.faturas_atrasadas, resultado.lancamentos_atrasados
        ));
        Ok(resultado)
    }
}
