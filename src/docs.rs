// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Faturas ---
        handlers::faturas::list_faturas,
        handlers::faturas::get_fatura,
        handlers::faturas::get_historico,
        handlers::faturas::gerar_faturas,
        handlers::faturas::transition_fatura,
        handlers::faturas::update_dados,
        handlers::faturas::upload_arquivo,
        handlers::faturas::delete_fatura,
        handlers::faturas::verificar_atrasos,

        // --- Financeiro ---
        handlers::lancamentos::create_lancamento,
        handlers::lancamentos::list_lancamentos,
        handlers::lancamentos::get_lancamento,
        handlers::lancamentos::get_historico,
        handlers::lancamentos::transition_lancamento,
        handlers::lancamentos::register_payment,
        handlers::lancamentos::delete_lancamento,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::list_variaveis,
        handlers::templates::get_default_template,
        handlers::templates::create_template,
        handlers::templates::get_template,
        handlers::templates::update_template,
        handlers::templates::reset_default_templates,
        handlers::templates::delete_template,

        // --- Unidades ---
        handlers::unidades::create_unidade,
        handlers::unidades::list_unidades,
        handlers::unidades::get_unidade,
        handlers::unidades::update_unidade,
        handlers::unidades::register_exit,

        // --- Cooperados ---
        handlers::cooperados::create_cooperado,
        handlers::cooperados::list_cooperados,
        handlers::cooperados::get_cooperado,
        handlers::cooperados::update_cooperado,
        handlers::cooperados::delete_cooperado,
        handlers::cooperados::ficha_cooperado,

        // --- Usinas ---
        handlers::usinas::create_usina,
        handlers::usinas::list_usinas,
        handlers::usinas::get_usina,
        handlers::usinas::update_usina,
        handlers::usinas::set_rateio,
        handlers::usinas::create_pagamento,
        handlers::usinas::list_pagamentos,

        // --- Endereços ---
        handlers::enderecos::lookup_cep,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Status e histórico ---
            models::status::StatusFatura,
            models::status::StatusLancamento,
            models::historico::HistoricoFatura,
            models::historico::HistoricoLancamento,
            models::periodo::Periodo,

            // --- Faturas ---
            models::fatura::Fatura,
            models::fatura::GeracaoResultado,
            models::fatura::DadosFaturaPayload,
            models::fatura::GerarFaturasPayload,
            models::fatura::TransicaoFaturaPayload,
            models::fatura::VerificacaoAtrasoResultado,

            // --- Financeiro ---
            models::lancamento::TipoLancamento,
            models::lancamento::LancamentoFinanceiro,
            models::lancamento::PagamentoInfo,
            models::lancamento::CreateLancamentoPayload,
            models::lancamento::TransicaoLancamentoPayload,

            // --- Templates ---
            models::template::TemplateCalculo,
            models::template::TemplatePayload,
            models::template::VariaveisDisponiveis,
            handlers::templates::ResetPadraoPayload,

            // --- Cadastros ---
            models::cooperado::TipoPessoa,
            models::cooperado::Cooperado,
            models::cooperado::CooperadoPayload,
            handlers::cooperados::CooperadoDetalhe,
            models::unidade::UnidadeBeneficiaria,
            models::unidade::UnidadePayload,
            models::unidade::SaidaUnidadePayload,
            models::usina::Usina,
            models::usina::UsinaPayload,
            models::usina::RateioItem,
            models::usina::RateioPayload,
            models::usina::PagamentoUsina,
            models::usina::PagamentoUsinaPayload,
            models::endereco::Endereco,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Faturas", description = "Faturas mensais das unidades beneficiárias"),
        (name = "Financeiro", description = "Receitas e despesas"),
        (name = "Templates", description = "Fórmulas de cálculo de desconto e assinatura"),
        (name = "Unidades", description = "Unidades consumidoras beneficiárias"),
        (name = "Cooperados", description = "Cadastro de cooperados"),
        (name = "Usinas", description = "Usinas, rateio e pagamentos ao investidor"),
        (name = "Endereços", description = "Consulta de CEP")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
