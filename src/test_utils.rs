// src/test_utils.rs
//
// Dados e montagem compartilhados pelos testes de serviço e de rotas.

use std::{str::FromStr, sync::Arc};

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::FixedClock, notifier::RecordingNotifier},
    config::{AppState, Repositories, Settings},
    db::memory::MemoryStore,
    models::{
        auth::Sessao,
        cooperado::{CooperadoPayload, TipoPessoa},
        template::{TemplateCalculo, TemplatePayload},
        unidade::UnidadePayload,
        usina::UsinaPayload,
    },
    router::create_router,
    services::arquivo_storage::LocalArquivoStorage,
};

pub const FORMULA_DESCONTO: &str = "(total_fatura - iluminacao_publica - outros_valores) * percentual_desconto / 100";
pub const FORMULA_ASSINATURA: &str = "total_fatura - valor_desconto - fatura_concessionaria";

pub fn sessao() -> Sessao {
    Sessao {
        user_id: Uuid::from_u128(0x0a11ce),
        cooperativa_id: Uuid::from_u128(0xc00b),
    }
}

pub fn d(ano: i32, mes: u32, dia: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(ano, mes, dia).unwrap()
}

pub fn dt(ano: i32, mes: u32, dia: u32, hora: u32) -> DateTime<Utc> {
    d(ano, mes, dia).and_hms_opt(hora, 0, 0).unwrap().and_utc()
}

pub fn payload_template(nome: &str, is_padrao: bool) -> TemplatePayload {
    TemplatePayload {
        nome: nome.to_string(),
        descricao: None,
        formula_desconto: FORMULA_DESCONTO.to_string(),
        formula_assinatura: FORMULA_ASSINATURA.to_string(),
        is_padrao,
    }
}

pub fn template_padrao(cooperativa_id: Uuid) -> TemplateCalculo {
    let agora = dt(2024, 1, 1, 0);
    TemplateCalculo {
        id: Uuid::new_v4(),
        cooperativa_id,
        nome: "Padrão".to_string(),
        descricao: None,
        formula_desconto: FORMULA_DESCONTO.to_string(),
        formula_assinatura: FORMULA_ASSINATURA.to_string(),
        is_padrao: true,
        created_at: agora,
        updated_at: agora,
    }
}

pub fn payload_cooperado() -> CooperadoPayload {
    CooperadoPayload {
        nome: "Maria da Silva".to_string(),
        tipo_pessoa: TipoPessoa::Fisica,
        documento: "529.982.247-25".to_string(),
        email: Some("maria@exemplo.com".to_string()),
        telefone: None,
        numero_cadastro: None,
        cep: Some("01310-100".to_string()),
        logradouro: Some("Avenida Paulista".to_string()),
        numero: Some("1000".to_string()),
        complemento: None,
        bairro: Some("Bela Vista".to_string()),
        cidade: Some("São Paulo".to_string()),
        uf: Some("SP".to_string()),
    }
}

pub fn payload_unidade(cooperado_id: Uuid, numero_uc: &str) -> UnidadePayload {
    UnidadePayload {
        cooperado_id,
        numero_uc: numero_uc.to_string(),
        apelido: None,
        cep: None,
        logradouro: None,
        numero: None,
        complemento: None,
        bairro: None,
        cidade: None,
        uf: None,
        percentual_desconto: Decimal::from(15),
        data_entrada: d(2024, 1, 1),
        template_calculo_id: None,
    }
}

pub fn payload_usina() -> UsinaPayload {
    UsinaPayload {
        nome: "Usina Sol Nascente".to_string(),
        potencia_kwp: Decimal::from(75),
        investidor_nome: "Investimentos Sol Ltda".to_string(),
        investidor_documento: None,
        valor_kwh: Decimal::from_str("0.45").unwrap(),
        ativa: true,
    }
}

/// Aplicação completa sobre o armazenamento em memória.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    _uploads: tempfile::TempDir,
}

pub fn setup_test_app(hoje: NaiveDate) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let uploads = tempfile::tempdir().unwrap();

    let settings = Settings {
        database_url: "postgres://memoria".to_string(),
        jwt_secret: "segredo-de-teste".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        cep_api_url: "http://127.0.0.1:9".to_string(),
        cep_timeout: std::time::Duration::from_millis(200),
        uploads_dir: uploads.path().to_path_buf(),
        fonts_dir: uploads.path().join("fonts"),
    };
    let repos = Repositories {
        users: store.clone(),
        faturas: store.clone(),
        lancamentos: store.clone(),
        unidades: store.clone(),
        templates: store.clone(),
        cooperados: store.clone(),
        usinas: store.clone(),
    };

    let mut state = AppState::build(
        settings,
        repos,
        Arc::new(LocalArquivoStorage::new(uploads.path())),
        Arc::new(FixedClock(hoje.and_hms_opt(12, 0, 0).unwrap().and_utc())),
        Arc::new(RecordingNotifier::default()),
    )
    .unwrap();
    state.auth_service = state.auth_service.clone().with_cost(4);

    TestApp { router: create_router(state), store, _uploads: uploads }
}
