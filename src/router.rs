// src/router.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Tamanho máximo do PDF da concessionária.
const LIMITE_ARQUIVO: usize = 10 * 1024 * 1024;

pub fn create_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let fatura_routes = Router::new()
        .route("/", get(handlers::faturas::list_faturas))
        .route("/gerar", post(handlers::faturas::gerar_faturas))
        .route("/verificar-atrasos", post(handlers::faturas::verificar_atrasos))
        .route(
            "/{id}",
            get(handlers::faturas::get_fatura).delete(handlers::faturas::delete_fatura),
        )
        .route("/{id}/historico", get(handlers::faturas::get_historico))
        .route("/{id}/status", post(handlers::faturas::transition_fatura))
        .route("/{id}/dados", put(handlers::faturas::update_dados))
        .route(
            "/{id}/arquivo",
            put(handlers::faturas::upload_arquivo).layer(DefaultBodyLimit::max(LIMITE_ARQUIVO)),
        );

    let lancamento_routes = Router::new()
        .route(
            "/",
            post(handlers::lancamentos::create_lancamento).get(handlers::lancamentos::list_lancamentos),
        )
        .route(
            "/{id}",
            get(handlers::lancamentos::get_lancamento).delete(handlers::lancamentos::delete_lancamento),
        )
        .route("/{id}/historico", get(handlers::lancamentos::get_historico))
        .route("/{id}/status", post(handlers::lancamentos::transition_lancamento))
        .route("/{id}/pagamento", post(handlers::lancamentos::register_payment));

    let template_routes = Router::new()
        .route(
            "/",
            get(handlers::templates::list_templates).post(handlers::templates::create_template),
        )
        .route("/padrao", get(handlers::templates::get_default_template))
        .route("/reset-padrao", post(handlers::templates::reset_default_templates))
        .route(
            "/{id}",
            get(handlers::templates::get_template)
                .put(handlers::templates::update_template)
                .delete(handlers::templates::delete_template),
        );

    let unidade_routes = Router::new()
        .route(
            "/",
            post(handlers::unidades::create_unidade).get(handlers::unidades::list_unidades),
        )
        .route(
            "/{id}",
            get(handlers::unidades::get_unidade).put(handlers::unidades::update_unidade),
        )
        .route("/{id}/saida", post(handlers::unidades::register_exit));

    let cooperado_routes = Router::new()
        .route(
            "/",
            post(handlers::cooperados::create_cooperado).get(handlers::cooperados::list_cooperados),
        )
        .route(
            "/{id}",
            get(handlers::cooperados::get_cooperado)
                .put(handlers::cooperados::update_cooperado)
                .delete(handlers::cooperados::delete_cooperado),
        )
        .route("/{id}/ficha", get(handlers::cooperados::ficha_cooperado));

    let usina_routes = Router::new()
        .route("/", post(handlers::usinas::create_usina).get(handlers::usinas::list_usinas))
        .route(
            "/{id}",
            get(handlers::usinas::get_usina).put(handlers::usinas::update_usina),
        )
        .route("/{id}/rateio", put(handlers::usinas::set_rateio))
        .route(
            "/{id}/pagamentos",
            post(handlers::usinas::create_pagamento).get(handlers::usinas::list_pagamentos),
        );

    // Tudo abaixo exige token e roda no escopo da cooperativa do usuário
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .nest("/faturas", fatura_routes)
        .nest("/lancamentos", lancamento_routes)
        .nest("/templates", template_routes)
        .nest("/unidades", unidade_routes)
        .nest("/cooperados", cooperado_routes)
        .nest("/usinas", usina_routes)
        .route("/enderecos/{cep}", get(handlers::enderecos::lookup_cep))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/templates/variaveis", get(handlers::templates::list_variaveis))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_utils::{d, sessao, setup_test_app};

    async fn call(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(router: &Router) -> String {
        let (status, body) = call(
            router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": "operador@coop.com",
                "password": "senha123",
                "cooperativaId": sessao().cooperativa_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = setup_test_app(d(2024, 4, 2));
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let app = setup_test_app(d(2024, 4, 2));
        let (status, _) = call(&app.router, Method::GET, "/api/faturas", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app.router, Method::GET, "/api/faturas", Some("lixo"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_returns_a_working_token() {
        let app = setup_test_app(d(2024, 4, 2));
        register(&app.router).await;

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "operador@coop.com", "password": "senha123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();

        let (status, me) = call(&app.router, Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "operador@coop.com");
        assert!(me.get("passwordHash").is_none() && me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = setup_test_app(d(2024, 4, 2));
        register(&app.router).await;

        let (status, _) = call(
            &app.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "operador@coop.com", "password": "errada1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generating_a_future_period_is_unprocessable() {
        let app = setup_test_app(d(2024, 4, 2));
        let token = register(&app.router).await;

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/faturas/gerar",
            Some(&token),
            Some(json!({ "mes": 5, "ano": 2024 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"]["mes"], 5);
    }

    #[tokio::test]
    async fn monthly_generation_through_the_api() {
        let app = setup_test_app(d(2024, 4, 2));
        let token = register(&app.router).await;

        let (status, cooperado) = call(
            &app.router,
            Method::POST,
            "/api/cooperados",
            Some(&token),
            Some(json!({
                "nome": "Maria da Silva",
                "tipoPessoa": "fisica",
                "documento": "529.982.247-25",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(
            &app.router,
            Method::POST,
            "/api/unidades",
            Some(&token),
            Some(json!({
                "cooperadoId": cooperado["id"],
                "numeroUc": "3012345678",
                "percentualDesconto": 15,
                "dataEntrada": "2024-01-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, resultado) = call(
            &app.router,
            Method::POST,
            "/api/faturas/gerar",
            Some(&token),
            Some(json!({ "mes": 3, "ano": 2024 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resultado["gerados"], 1);

        let (status, faturas) = call(&app.router, Method::GET, "/api/faturas?mes=3&ano=2024", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(faturas.as_array().unwrap().len(), 1);
        assert_eq!(faturas[0]["status"], "pendente");
        assert_eq!(app.store.count_faturas(), 1);
    }

    #[tokio::test]
    async fn invalid_cpf_is_reported_per_field() {
        let app = setup_test_app(d(2024, 4, 2));
        let token = register(&app.router).await;

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/cooperados",
            Some(&token),
            Some(json!({ "nome": "Fulano", "tipoPessoa": "fisica", "documento": "111.111.111-11" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].get("documento").is_some());
    }

    #[tokio::test]
    async fn formula_variables_are_public() {
        let app = setup_test_app(d(2024, 4, 2));
        let (status, body) = call(&app.router, Method::GET, "/api/templates/variaveis", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let nomes: Vec<&str> = body["variaveis"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
        assert!(nomes.contains(&"total_fatura"));
    }
}
