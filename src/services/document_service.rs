// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::Sessao,
        cooperado::{Cooperado, TipoPessoa},
        unidade::UnidadeBeneficiaria,
    },
    services::cooperado_service::CooperadoService,
};

const FONTE: &str = "Roboto";

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

#[derive(Clone)]
pub struct DocumentService {
    cooperados: CooperadoService,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(cooperados: CooperadoService, fonts_dir: impl Into<PathBuf>) -> Self {
        Self { cooperados, fonts_dir: fonts_dir.into() }
    }

    /// Ficha cadastral do cooperado com as unidades beneficiárias.
    pub async fn ficha_cooperado(&self, sessao: &Sessao, cooperado_id: Uuid) -> Result<Vec<u8>, AppError> {
        let (cooperado, unidades) = self.cooperados.get_with_unidades(sessao, cooperado_id).await?;
        let fonts_dir = self.fonts_dir.clone();

        // genpdf é síncrono
        let pdf = tokio::task::spawn_blocking(move || render_ficha(&fonts_dir, &cooperado, &unidades))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de renderização: {}", e))??;

        tracing::debug!(%cooperado_id, bytes = pdf.len(), "Ficha do cooperado gerada");
        Ok(pdf)
    }
}

fn render_ficha(
    fonts_dir: &std::path::Path,
    cooperado: &Cooperado,
    unidades: &[UnidadeBeneficiaria],
) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONTE, None)
        .map_err(|_| AppError::FontNotFound(format!("{} em {}", FONTE, fonts_dir.display())))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Ficha - {}", cooperado.nome));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(elements::Paragraph::new("FICHA DO COOPERADO").styled(style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Break::new(1.5));

    let rotulo_documento = match cooperado.tipo_pessoa {
        TipoPessoa::Fisica => "CPF",
        TipoPessoa::Juridica => "CNPJ",
    };
    doc.push(elements::Paragraph::new(format!("Nome: {}", cooperado.nome)));
    doc.push(elements::Paragraph::new(format!("{}: {}", rotulo_documento, cooperado.documento)));
    if let Some(cadastro) = &cooperado.numero_cadastro {
        doc.push(elements::Paragraph::new(format!("Nº de cadastro: {}", cadastro)));
    }
    if let Some(email) = &cooperado.email {
        doc.push(elements::Paragraph::new(format!("E-mail: {}", email)));
    }
    if let Some(telefone) = &cooperado.telefone {
        doc.push(elements::Paragraph::new(format!("Telefone: {}", telefone)));
    }

    let endereco: Vec<&str> = [
        cooperado.logradouro.as_deref(),
        cooperado.numero.as_deref(),
        cooperado.bairro.as_deref(),
        cooperado.cidade.as_deref(),
        cooperado.uf.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !endereco.is_empty() {
        doc.push(elements::Paragraph::new(format!("Endereço: {}", endereco.join(", "))));
    }

    doc.push(elements::Break::new(2));
    doc.push(
        elements::Paragraph::new(format!("UNIDADES BENEFICIÁRIAS ({})", unidades.len()))
            .styled(style::Style::new().bold().with_font_size(12)),
    );

    // Pesos: UC (3), Apelido (3), Desconto (2), Entrada (2), Situação (2)
    let mut table = elements::TableLayout::new(vec![3, 3, 2, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("UC").styled(bold))
        .element(elements::Paragraph::new("Apelido").styled(bold))
        .element(elements::Paragraph::new("Desconto").styled(bold))
        .element(elements::Paragraph::new("Entrada").styled(bold))
        .element(elements::Paragraph::new("Situação").styled(bold))
        .push()
        .map_err(pdf_error)?;

    for u in unidades {
        let situacao = match u.data_saida {
            Some(saida) => format!("Saiu em {}", saida.format("%d/%m/%Y")),
            None => "Ativa".to_string(),
        };
        table
            .row()
            .element(elements::Paragraph::new(u.numero_uc.clone()))
            .element(elements::Paragraph::new(u.apelido.clone().unwrap_or_default()))
            .element(elements::Paragraph::new(format!("{:.2}%", u.percentual_desconto)))
            .element(elements::Paragraph::new(u.data_entrada.format("%d/%m/%Y").to_string()))
            .element(elements::Paragraph::new(situacao))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}
