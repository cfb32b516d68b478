// src/handlers.rs

pub mod auth;
pub mod cooperados;
pub mod enderecos;
pub mod faturas;
pub mod lancamentos;
pub mod templates;
pub mod unidades;
pub mod usinas;
