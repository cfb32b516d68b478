// src/db/memory.rs
//
// Implementação em memória de todos os repositórios, usada pelos testes de
// serviço e de rotas. Reproduz as regras que o banco garante: unicidade de
// fatura por período, checagem de `versao`, soft-delete e escopo por
// cooperativa.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        CooperadoRepository, FaturaRepository, LancamentoRepository, NovoPagamentoUsina, TemplateRepository,
        UnidadeRepository, UserRepository, UsinaRepository,
    },
    models::{
        auth::{Sessao, User},
        cooperado::{Cooperado, CooperadoPayload},
        fatura::{DadosCalculados, Fatura, FaturaStatusUpdate, FiltroFaturas, NovaFatura},
        lancamento::{FiltroLancamentos, LancamentoFinanceiro, LancamentoStatusUpdate, NovoLancamento},
        periodo::Periodo,
        status::{StatusFatura, StatusLancamento},
        template::{TemplateCalculo, TemplatePayload},
        unidade::{FiltroUnidades, UnidadeBeneficiaria, UnidadePayload},
        usina::{PagamentoUsina, RateioItem, Usina, UsinaPayload},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub faturas: Mutex<Vec<Fatura>>,
    pub lancamentos: Mutex<Vec<LancamentoFinanceiro>>,
    pub unidades: Mutex<Vec<UnidadeBeneficiaria>>,
    pub templates: Mutex<Vec<TemplateCalculo>>,
    pub cooperados: Mutex<Vec<Cooperado>>,
    pub usinas: Mutex<Vec<Usina>>,
    pub pagamentos: Mutex<Vec<PagamentoUsina>>,
    /// Unidade cuja inserção de fatura deve falhar.
    pub falhar_fatura_da_unidade: Mutex<Option<Uuid>>,
}

impl MemoryStore {
    pub fn add_unidade(&self, unidade: UnidadeBeneficiaria) {
        self.unidades.lock().unwrap().push(unidade);
    }

    pub fn add_template(&self, template: TemplateCalculo) {
        self.templates.lock().unwrap().push(template);
    }

    pub fn add_fatura(&self, fatura: Fatura) {
        self.faturas.lock().unwrap().push(fatura);
    }

    pub fn add_lancamento(&self, lancamento: LancamentoFinanceiro) {
        self.lancamentos.lock().unwrap().push(lancamento);
    }

    pub fn fatura(&self, id: Uuid) -> Option<Fatura> {
        self.faturas.lock().unwrap().iter().find(|f| f.id == id).cloned()
    }

    pub fn lancamento(&self, id: Uuid) -> Option<LancamentoFinanceiro> {
        self.lancamentos.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }

    pub fn count_faturas(&self) -> usize {
        self.faturas.lock().unwrap().len()
    }
}

// =============================================================================
//  USERS
// =============================================================================

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        nome: Option<&str>,
        cooperativa_id: Uuid,
    ) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let agora = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            cooperativa_id,
            email: email.to_string(),
            nome: nome.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at: agora,
            updated_at: agora,
        };
        users.push(user.clone());
        Ok(user)
    }
}

// =============================================================================
//  FATURAS
// =============================================================================

#[async_trait]
impl FaturaRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroFaturas) -> Result<Vec<Fatura>, AppError> {
        let mut faturas: Vec<Fatura> = self
            .faturas
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.cooperativa_id == sessao.cooperativa_id && filtro.matches(f))
            .cloned()
            .collect();
        faturas.sort_by(|a, b| (b.ano, b.mes).cmp(&(a.ano, a.mes)));
        Ok(faturas)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Fatura>, AppError> {
        Ok(self
            .faturas
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id && f.cooperativa_id == sessao.cooperativa_id)
            .cloned())
    }

    async fn exists_for_period(
        &self,
        _sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<bool, AppError> {
        Ok(self.faturas.lock().unwrap().iter().any(|f| {
            f.unidade_beneficiaria_id == unidade_id && f.mes == periodo.mes as i32 && f.ano == periodo.ano
        }))
    }

    async fn insert(&self, sessao: &Sessao, nova: &NovaFatura) -> Result<Fatura, AppError> {
        if *self.falhar_fatura_da_unidade.lock().unwrap() == Some(nova.unidade_beneficiaria_id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("falha simulada")));
        }

        let mut faturas = self.faturas.lock().unwrap();
        let duplicada = faturas.iter().any(|f| {
            f.unidade_beneficiaria_id == nova.unidade_beneficiaria_id
                && f.mes == nova.periodo.mes as i32
                && f.ano == nova.periodo.ano
        });
        if duplicada {
            return Err(AppError::UniqueConstraintViolation("faturas_unidade_periodo_key".into()));
        }

        let agora = Utc::now();
        let fatura = Fatura {
            id: Uuid::new_v4(),
            cooperativa_id: sessao.cooperativa_id,
            unidade_beneficiaria_id: nova.unidade_beneficiaria_id,
            mes: nova.periodo.mes as i32,
            ano: nova.periodo.ano,
            consumo_kwh: Decimal::ZERO,
            total_fatura: Decimal::ZERO,
            iluminacao_publica: Decimal::ZERO,
            outros_valores: Decimal::ZERO,
            fatura_concessionaria: Decimal::ZERO,
            valor_desconto: Decimal::ZERO,
            valor_assinatura: Decimal::ZERO,
            economia_mes: Decimal::ZERO,
            economia_acumulada: Decimal::ZERO,
            saldo_energia_kwh: Decimal::ZERO,
            data_vencimento: None,
            status: StatusFatura::Pendente,
            historico_status: nova.historico_status.clone(),
            arquivo_concessionaria: None,
            data_envio: None,
            data_confirmacao_pagamento: None,
            data_pagamento: None,
            versao: 1,
            created_at: agora,
            updated_at: agora,
        };
        faturas.push(fatura.clone());
        Ok(fatura)
    }

    async fn update_status(&self, sessao: &Sessao, update: &FaturaStatusUpdate) -> Result<Fatura, AppError> {
        let mut faturas = self.faturas.lock().unwrap();
        let fatura = faturas
            .iter_mut()
            .find(|f| {
                f.id == update.id && f.versao == update.versao_esperada && f.cooperativa_id == sessao.cooperativa_id
            })
            .ok_or(AppError::Conflict)?;

        fatura.status = update.novo_status;
        fatura.historico_status = update.historico_status.clone();
        fatura.data_envio = update.data_envio;
        fatura.data_confirmacao_pagamento = update.data_confirmacao_pagamento;
        fatura.data_pagamento = update.data_pagamento;
        fatura.versao += 1;
        fatura.updated_at = Utc::now();
        Ok(fatura.clone())
    }

    async fn update_dados(&self, sessao: &Sessao, dados: &DadosCalculados) -> Result<Fatura, AppError> {
        let mut faturas = self.faturas.lock().unwrap();
        let fatura = faturas
            .iter_mut()
            .find(|f| f.id == dados.id && f.versao == dados.versao_esperada && f.cooperativa_id == sessao.cooperativa_id)
            .ok_or(AppError::Conflict)?;

        fatura.consumo_kwh = dados.consumo_kwh;
        fatura.total_fatura = dados.total_fatura;
        fatura.iluminacao_publica = dados.iluminacao_publica;
        fatura.outros_valores = dados.outros_valores;
        fatura.fatura_concessionaria = dados.fatura_concessionaria;
        fatura.saldo_energia_kwh = dados.saldo_energia_kwh;
        fatura.data_vencimento = dados.data_vencimento;
        fatura.valor_desconto = dados.valor_desconto;
        fatura.valor_assinatura = dados.valor_assinatura;
        fatura.economia_mes = dados.economia_mes;
        fatura.economia_acumulada = dados.economia_acumulada;
        fatura.versao += 1;
        fatura.updated_at = Utc::now();
        Ok(fatura.clone())
    }

    async fn set_arquivo(&self, sessao: &Sessao, id: Uuid, caminho: &str) -> Result<Fatura, AppError> {
        let mut faturas = self.faturas.lock().unwrap();
        let fatura = faturas
            .iter_mut()
            .find(|f| f.id == id && f.cooperativa_id == sessao.cooperativa_id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("fatura {}", id)))?;
        fatura.arquivo_concessionaria = Some(caminho.to_string());
        Ok(fatura.clone())
    }

    async fn sum_economia_before(
        &self,
        _sessao: &Sessao,
        unidade_id: Uuid,
        periodo: Periodo,
    ) -> Result<Decimal, AppError> {
        Ok(self
            .faturas
            .lock()
            .unwrap()
            .iter()
            .filter(|f| {
                f.unidade_beneficiaria_id == unidade_id
                    && (f.ano < periodo.ano || (f.ano == periodo.ano && f.mes < periodo.mes as i32))
            })
            .map(|f| f.economia_mes)
            .sum())
    }

    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<Fatura>, AppError> {
        Ok(self
            .faturas
            .lock()
            .unwrap()
            .iter()
            .filter(|f| {
                f.cooperativa_id == sessao.cooperativa_id
                    && matches!(f.status, StatusFatura::Enviada | StatusFatura::Reenviada)
                    && f.data_vencimento.is_some_and(|v| v < hoje)
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<Option<String>, AppError> {
        let removida = {
            let mut faturas = self.faturas.lock().unwrap();
            let posicao = faturas
                .iter()
                .position(|f| f.id == id && f.cooperativa_id == sessao.cooperativa_id);
            posicao.map(|p| faturas.remove(p))
        };

        let Some(fatura) = removida else {
            return Ok(None);
        };

        let agora = Utc::now();
        for l in self.lancamentos.lock().unwrap().iter_mut() {
            if l.fatura_id == Some(id) && l.deleted_at.is_none() {
                l.deleted_at = Some(agora);
                l.fatura_id = None;
            }
        }
        Ok(fatura.arquivo_concessionaria)
    }
}

// =============================================================================
//  LANÇAMENTOS
// =============================================================================

#[async_trait]
impl LancamentoRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroLancamentos) -> Result<Vec<LancamentoFinanceiro>, AppError> {
        let mut lancamentos: Vec<LancamentoFinanceiro> = self
            .lancamentos
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.cooperativa_id == sessao.cooperativa_id && filtro.matches(l))
            .cloned()
            .collect();
        lancamentos.sort_by_key(|l| l.data_vencimento);
        Ok(lancamentos)
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError> {
        Ok(self
            .lancamentos
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id && l.cooperativa_id == sessao.cooperativa_id && l.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_fatura(&self, sessao: &Sessao, fatura_id: Uuid) -> Result<Option<LancamentoFinanceiro>, AppError> {
        Ok(self
            .lancamentos
            .lock()
            .unwrap()
            .iter()
            .find(|l| {
                l.fatura_id == Some(fatura_id) && l.cooperativa_id == sessao.cooperativa_id && l.deleted_at.is_none()
            })
            .cloned())
    }

    async fn insert(&self, sessao: &Sessao, novo: &NovoLancamento) -> Result<LancamentoFinanceiro, AppError> {
        let agora = Utc::now();
        let lancamento = LancamentoFinanceiro {
            id: Uuid::new_v4(),
            cooperativa_id: sessao.cooperativa_id,
            tipo: novo.tipo,
            descricao: novo.descricao.clone(),
            valor: novo.valor,
            valor_pago: None,
            juros: None,
            desconto: None,
            data_vencimento: novo.data_vencimento,
            data_pagamento: None,
            status: StatusLancamento::Pendente,
            historico_status: Default::default(),
            fatura_id: novo.fatura_id,
            pagamento_usina_id: novo.pagamento_usina_id,
            cooperado_id: novo.cooperado_id,
            observacao: novo.observacao.clone(),
            deleted_at: None,
            versao: 1,
            created_at: agora,
            updated_at: agora,
        };
        self.lancamentos.lock().unwrap().push(lancamento.clone());
        Ok(lancamento)
    }

    async fn update_status(
        &self,
        sessao: &Sessao,
        update: &LancamentoStatusUpdate,
    ) -> Result<LancamentoFinanceiro, AppError> {
        let mut lancamentos = self.lancamentos.lock().unwrap();
        let l = lancamentos
            .iter_mut()
            .find(|l| {
                l.id == update.id
                    && l.versao == update.versao_esperada
                    && l.cooperativa_id == sessao.cooperativa_id
                    && l.deleted_at.is_none()
            })
            .ok_or(AppError::Conflict)?;

        l.status = update.novo_status;
        l.historico_status = update.historico_status.clone();
        l.data_pagamento = update.data_pagamento;
        l.valor_pago = update.valor_pago;
        l.juros = update.juros;
        l.desconto = update.desconto;
        l.observacao = update.observacao.clone();
        l.versao += 1;
        l.updated_at = Utc::now();
        Ok(l.clone())
    }

    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let mut lancamentos = self.lancamentos.lock().unwrap();
        match lancamentos
            .iter_mut()
            .find(|l| l.id == id && l.cooperativa_id == sessao.cooperativa_id && l.deleted_at.is_none())
        {
            Some(l) => {
                l.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_overdue(&self, sessao: &Sessao, hoje: NaiveDate) -> Result<Vec<LancamentoFinanceiro>, AppError> {
        Ok(self
            .lancamentos
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                l.cooperativa_id == sessao.cooperativa_id
                    && l.deleted_at.is_none()
                    && l.status == StatusLancamento::Pendente
                    && l.data_vencimento < hoje
            })
            .cloned()
            .collect())
    }
}

// =============================================================================
//  UNIDADES
// =============================================================================

fn unidade_from_payload(id: Uuid, cooperativa_id: Uuid, p: &UnidadePayload) -> UnidadeBeneficiaria {
    let agora = Utc::now();
    UnidadeBeneficiaria {
        id,
        cooperativa_id,
        cooperado_id: p.cooperado_id,
        numero_uc: p.numero_uc.clone(),
        apelido: p.apelido.clone(),
        cep: p.cep.clone(),
        logradouro: p.logradouro.clone(),
        numero: p.numero.clone(),
        complemento: p.complemento.clone(),
        bairro: p.bairro.clone(),
        cidade: p.cidade.clone(),
        uf: p.uf.clone(),
        percentual_desconto: p.percentual_desconto,
        data_entrada: p.data_entrada,
        data_saida: None,
        template_calculo_id: p.template_calculo_id,
        usina_id: None,
        percentual_rateio: None,
        created_at: agora,
        updated_at: agora,
    }
}

#[async_trait]
impl UnidadeRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao, filtro: &FiltroUnidades) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        Ok(self
            .unidades
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.cooperativa_id == sessao.cooperativa_id && filtro.matches(u))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        Ok(self
            .unidades
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.cooperativa_id == sessao.cooperativa_id)
            .cloned())
    }

    async fn insert(&self, sessao: &Sessao, payload: &UnidadePayload) -> Result<UnidadeBeneficiaria, AppError> {
        let mut unidades = self.unidades.lock().unwrap();
        if unidades.iter().any(|u| u.numero_uc == payload.numero_uc) {
            return Err(AppError::UniqueConstraintViolation(format!("UC {}", payload.numero_uc)));
        }
        let unidade = unidade_from_payload(Uuid::new_v4(), sessao.cooperativa_id, payload);
        unidades.push(unidade.clone());
        Ok(unidade)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &UnidadePayload,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        let mut unidades = self.unidades.lock().unwrap();
        let Some(u) = unidades
            .iter_mut()
            .find(|u| u.id == id && u.cooperativa_id == sessao.cooperativa_id)
        else {
            return Ok(None);
        };
        let mut nova = unidade_from_payload(id, sessao.cooperativa_id, payload);
        nova.data_saida = u.data_saida;
        nova.usina_id = u.usina_id;
        nova.percentual_rateio = u.percentual_rateio;
        nova.created_at = u.created_at;
        *u = nova;
        Ok(Some(u.clone()))
    }

    async fn set_saida(
        &self,
        sessao: &Sessao,
        id: Uuid,
        data_saida: NaiveDate,
    ) -> Result<Option<UnidadeBeneficiaria>, AppError> {
        let mut unidades = self.unidades.lock().unwrap();
        Ok(unidades
            .iter_mut()
            .find(|u| u.id == id && u.cooperativa_id == sessao.cooperativa_id)
            .map(|u| {
                u.data_saida = Some(data_saida);
                u.clone()
            }))
    }

    async fn list_active_entered_by(
        &self,
        sessao: &Sessao,
        ultimo_dia: NaiveDate,
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        Ok(self
            .unidades
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.cooperativa_id == sessao.cooperativa_id && u.is_active() && u.data_entrada <= ultimo_dia)
            .cloned()
            .collect())
    }

    async fn replace_rateio(
        &self,
        sessao: &Sessao,
        usina_id: Uuid,
        itens: &[RateioItem],
    ) -> Result<Vec<UnidadeBeneficiaria>, AppError> {
        let mut unidades = self.unidades.lock().unwrap();

        // tudo ou nada, como a transação do Postgres
        for item in itens {
            if !unidades
                .iter()
                .any(|u| u.id == item.unidade_beneficiaria_id && u.cooperativa_id == sessao.cooperativa_id)
            {
                return Err(AppError::ResourceNotFound(format!("unidade {}", item.unidade_beneficiaria_id)));
            }
        }

        for u in unidades.iter_mut().filter(|u| u.usina_id == Some(usina_id)) {
            u.usina_id = None;
            u.percentual_rateio = None;
        }
        for item in itens {
            if let Some(u) = unidades.iter_mut().find(|u| u.id == item.unidade_beneficiaria_id) {
                u.usina_id = Some(usina_id);
                u.percentual_rateio = Some(item.percentual);
            }
        }

        Ok(unidades.iter().filter(|u| u.usina_id == Some(usina_id)).cloned().collect())
    }
}

// =============================================================================
//  TEMPLATES
// =============================================================================

fn reset_defaults(templates: &mut [TemplateCalculo], cooperativa_id: Uuid, except_id: Option<Uuid>) -> u64 {
    let mut rebaixados = 0;
    for t in templates
        .iter_mut()
        .filter(|t| t.cooperativa_id == cooperativa_id && t.is_padrao && Some(t.id) != except_id)
    {
        t.is_padrao = false;
        rebaixados += 1;
    }
    rebaixados
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<TemplateCalculo>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.cooperativa_id == sessao.cooperativa_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<TemplateCalculo>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.cooperativa_id == sessao.cooperativa_id)
            .cloned())
    }

    async fn get_default(&self, sessao: &Sessao) -> Result<Option<TemplateCalculo>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.cooperativa_id == sessao.cooperativa_id && t.is_padrao)
            .cloned())
    }

    async fn insert(&self, sessao: &Sessao, payload: &TemplatePayload) -> Result<TemplateCalculo, AppError> {
        let mut templates = self.templates.lock().unwrap();
        if payload.is_padrao {
            reset_defaults(&mut templates, sessao.cooperativa_id, None);
        }
        let agora = Utc::now();
        let template = TemplateCalculo {
            id: Uuid::new_v4(),
            cooperativa_id: sessao.cooperativa_id,
            nome: payload.nome.clone(),
            descricao: payload.descricao.clone(),
            formula_desconto: payload.formula_desconto.clone(),
            formula_assinatura: payload.formula_assinatura.clone(),
            is_padrao: payload.is_padrao,
            created_at: agora,
            updated_at: agora,
        };
        templates.push(template.clone());
        Ok(template)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &TemplatePayload,
    ) -> Result<Option<TemplateCalculo>, AppError> {
        let mut templates = self.templates.lock().unwrap();
        if !templates.iter().any(|t| t.id == id && t.cooperativa_id == sessao.cooperativa_id) {
            return Ok(None);
        }
        if payload.is_padrao {
            reset_defaults(&mut templates, sessao.cooperativa_id, Some(id));
        }
        let t = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("template {}", id)))?;
        t.nome = payload.nome.clone();
        t.descricao = payload.descricao.clone();
        t.formula_desconto = payload.formula_desconto.clone();
        t.formula_assinatura = payload.formula_assinatura.clone();
        t.is_padrao = payload.is_padrao;
        t.updated_at = Utc::now();
        Ok(Some(t.clone()))
    }

    async fn reset_default_templates(&self, sessao: &Sessao, except_id: Option<Uuid>) -> Result<u64, AppError> {
        let mut templates = self.templates.lock().unwrap();
        Ok(reset_defaults(&mut templates, sessao.cooperativa_id, except_id))
    }

    async fn delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let unidades = self.unidades.lock().unwrap();
        if unidades.iter().any(|u| u.template_calculo_id == Some(id)) {
            return Err(AppError::TemplateInUse(id));
        }
        let mut templates = self.templates.lock().unwrap();
        let antes = templates.len();
        templates.retain(|t| !(t.id == id && t.cooperativa_id == sessao.cooperativa_id));
        Ok(templates.len() < antes)
    }
}

// =============================================================================
//  COOPERADOS
// =============================================================================

fn cooperado_from_payload(id: Uuid, cooperativa_id: Uuid, p: &CooperadoPayload) -> Cooperado {
    let agora = Utc::now();
    Cooperado {
        id,
        cooperativa_id,
        nome: p.nome.clone(),
        tipo_pessoa: p.tipo_pessoa,
        documento: crate::common::documento::normalize(&p.documento),
        email: p.email.clone(),
        telefone: p.telefone.clone(),
        numero_cadastro: p.numero_cadastro.clone(),
        cep: p.cep.as_deref().map(crate::common::documento::normalize),
        logradouro: p.logradouro.clone(),
        numero: p.numero.clone(),
        complemento: p.complemento.clone(),
        bairro: p.bairro.clone(),
        cidade: p.cidade.clone(),
        uf: p.uf.clone(),
        deleted_at: None,
        created_at: agora,
        updated_at: agora,
    }
}

#[async_trait]
impl CooperadoRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Cooperado>, AppError> {
        Ok(self
            .cooperados
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.cooperativa_id == sessao.cooperativa_id && c.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Cooperado>, AppError> {
        Ok(self
            .cooperados
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id && c.cooperativa_id == sessao.cooperativa_id && c.deleted_at.is_none())
            .cloned())
    }

    async fn insert(&self, sessao: &Sessao, payload: &CooperadoPayload) -> Result<Cooperado, AppError> {
        let mut cooperados = self.cooperados.lock().unwrap();
        let novo = cooperado_from_payload(Uuid::new_v4(), sessao.cooperativa_id, payload);
        if cooperados
            .iter()
            .any(|c| c.cooperativa_id == sessao.cooperativa_id && c.documento == novo.documento && c.deleted_at.is_none())
        {
            return Err(AppError::UniqueConstraintViolation(format!("documento {}", novo.documento)));
        }
        cooperados.push(novo.clone());
        Ok(novo)
    }

    async fn update(
        &self,
        sessao: &Sessao,
        id: Uuid,
        payload: &CooperadoPayload,
    ) -> Result<Option<Cooperado>, AppError> {
        let mut cooperados = self.cooperados.lock().unwrap();
        Ok(cooperados
            .iter_mut()
            .find(|c| c.id == id && c.cooperativa_id == sessao.cooperativa_id && c.deleted_at.is_none())
            .map(|c| {
                let created_at = c.created_at;
                *c = cooperado_from_payload(id, sessao.cooperativa_id, payload);
                c.created_at = created_at;
                c.clone()
            }))
    }

    async fn soft_delete(&self, sessao: &Sessao, id: Uuid) -> Result<bool, AppError> {
        let mut cooperados = self.cooperados.lock().unwrap();
        match cooperados
            .iter_mut()
            .find(|c| c.id == id && c.cooperativa_id == sessao.cooperativa_id && c.deleted_at.is_none())
        {
            Some(c) => {
                c.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// =============================================================================
//  USINAS
// =============================================================================

fn usina_from_payload(id: Uuid, cooperativa_id: Uuid, p: &UsinaPayload) -> Usina {
    let agora = Utc::now();
    Usina {
        id,
        cooperativa_id,
        nome: p.nome.clone(),
        potencia_kwp: p.potencia_kwp,
        investidor_nome: p.investidor_nome.clone(),
        investidor_documento: p.investidor_documento.clone(),
        valor_kwh: p.valor_kwh,
        ativa: p.ativa,
        created_at: agora,
        updated_at: agora,
    }
}

#[async_trait]
impl UsinaRepository for MemoryStore {
    async fn list(&self, sessao: &Sessao) -> Result<Vec<Usina>, AppError> {
        Ok(self
            .usinas
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.cooperativa_id == sessao.cooperativa_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, sessao: &Sessao, id: Uuid) -> Result<Option<Usina>, AppError> {
        Ok(self
            .usinas
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.cooperativa_id == sessao.cooperativa_id)
            .cloned())
    }

    async fn insert(&self, sessao: &Sessao, payload: &UsinaPayload) -> Result<Usina, AppError> {
        let usina = usina_from_payload(Uuid::new_v4(), sessao.cooperativa_id, payload);
        self.usinas.lock().unwrap().push(usina.clone());
        Ok(usina)
    }

    async fn update(&self, sessao: &Sessao, id: Uuid, payload: &UsinaPayload) -> Result<Option<Usina>, AppError> {
        let mut usinas = self.usinas.lock().unwrap();
        Ok(usinas
            .iter_mut()
            .find(|u| u.id == id && u.cooperativa_id == sessao.cooperativa_id)
            .map(|u| {
                let created_at = u.created_at;
                *u = usina_from_payload(id, sessao.cooperativa_id, payload);
                u.created_at = created_at;
                u.clone()
            }))
    }

    async fn insert_pagamento(&self, sessao: &Sessao, novo: &NovoPagamentoUsina) -> Result<PagamentoUsina, AppError> {
        let mut pagamentos = self.pagamentos.lock().unwrap();
        if pagamentos.iter().any(|p| {
            p.usina_id == novo.usina_id && p.mes == novo.periodo.mes as i32 && p.ano == novo.periodo.ano
        }) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "pagamento {:02}/{}",
                novo.periodo.mes, novo.periodo.ano
            )));
        }
        let pagamento = PagamentoUsina {
            id: Uuid::new_v4(),
            cooperativa_id: sessao.cooperativa_id,
            usina_id: novo.usina_id,
            mes: novo.periodo.mes as i32,
            ano: novo.periodo.ano,
            geracao_kwh: novo.geracao_kwh,
            valor_total: novo.valor_total,
            data_vencimento: novo.data_vencimento,
            created_at: Utc::now(),
        };
        pagamentos.push(pagamento.clone());
        Ok(pagamento)
    }

    async fn list_pagamentos(&self, sessao: &Sessao, usina_id: Uuid) -> Result<Vec<PagamentoUsina>, AppError> {
        Ok(self
            .pagamentos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.usina_id == usina_id && p.cooperativa_id == sessao.cooperativa_id)
            .cloned()
            .collect())
    }
}
