// src/services/cep_service.rs

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    common::{documento, error::AppError},
    models::endereco::Endereco,
};

/// Cliente do serviço de CEP (formato ViaCEP).
#[derive(Clone)]
pub struct CepService {
    http: reqwest::Client,
    base_url: String,
}

// Resposta crua: o ViaCEP devolve 200 com `{"erro": true}` (ou `"true"`)
// para CEP inexistente.
#[derive(Debug, Deserialize)]
struct ViaCepResposta {
    #[serde(default)]
    erro: Option<Value>,
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepResposta {
    fn is_erro(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

impl CepService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(e.into()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn lookup(&self, cep: &str) -> Result<Endereco, AppError> {
        let digitos = documento::normalize(cep);
        if digitos.len() != 8 {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("cep");
            err.message = Some("CEP deve ter 8 dígitos.".into());
            errors.add("cep", err);
            return Err(AppError::ValidationError(errors));
        }

        let url = format!("{}/{}/json/", self.base_url, digitos);
        let resp = self.http.get(&url).send().await.map_err(|e| {
            tracing::warn!(%url, "Falha na consulta de CEP: {}", e);
            AppError::CepServiceUnavailable(e.to_string())
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(AppError::CepNotFound(digitos));
        }
        if !status.is_success() {
            return Err(AppError::CepServiceUnavailable(format!("status {}", status.as_u16())));
        }

        let corpo: ViaCepResposta = resp
            .json()
            .await
            .map_err(|e| AppError::CepServiceUnavailable(e.to_string()))?;

        if corpo.is_erro() {
            return Err(AppError::CepNotFound(digitos));
        }

        let complemento = Some(corpo.complemento).filter(|c| !c.is_empty());
        tracing::debug!(cep = %digitos, cidade = %corpo.localidade, "CEP encontrado");
        Ok(Endereco {
            cep: documento::normalize(&corpo.cep),
            logradouro: corpo.logradouro,
            complemento,
            bairro: corpo.bairro,
            cidade: corpo.localidade,
            uf: corpo.uf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(uri: &str) -> CepService {
        CepService::new(uri, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn maps_viacep_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/01310100/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cep": "01310-100",
                "logradouro": "Avenida Paulista",
                "complemento": "",
                "bairro": "Bela Vista",
                "localidade": "São Paulo",
                "uf": "SP",
                "ibge": "3550308"
            })))
            .mount(&server)
            .await;

        let endereco = service(&server.uri()).lookup("01310-100").await.unwrap();
        assert_eq!(endereco.cep, "01310100");
        assert_eq!(endereco.cidade, "São Paulo");
        assert_eq!(endereco.complemento, None);
    }

    #[tokio::test]
    async fn erro_flag_means_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "erro": "true" })))
            .mount(&server)
            .await;

        let err = service(&server.uri()).lookup("99999999").await.unwrap_err();
        assert!(matches!(err, AppError::CepNotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = service(&server.uri()).lookup("01310100").await.unwrap_err();
        assert!(matches!(err, AppError::CepServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let err = service("http://127.0.0.1:1").lookup("01310100").await.unwrap_err();
        assert!(matches!(err, AppError::CepServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_cep_never_leaves_the_process() {
        let err = service("http://127.0.0.1:1").lookup("123").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
