// src/services/formula.rs
//
// Fórmulas dos templates de cálculo: aritmética decimal sobre um vocabulário
// fixo de variáveis. A fórmula é analisada ao salvar o template, então uma
// fórmula gravada sempre tem sintaxe e variáveis válidas.

use std::fmt;

use rust_decimal::Decimal;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variavel {
    TotalFatura,
    IluminacaoPublica,
    OutrosValores,
    FaturaConcessionaria,
    ValorDesconto,
    PercentualDesconto,
}

impl Variavel {
    pub const TODAS: [Variavel; 6] = [
        Variavel::TotalFatura,
        Variavel::IluminacaoPublica,
        Variavel::OutrosValores,
        Variavel::FaturaConcessionaria,
        Variavel::ValorDesconto,
        Variavel::PercentualDesconto,
    ];

    pub fn nome(self) -> &'static str {
        match self {
            Variavel::TotalFatura => "total_fatura",
            Variavel::IluminacaoPublica => "iluminacao_publica",
            Variavel::OutrosValores => "outros_valores",
            Variavel::FaturaConcessionaria => "fatura_concessionaria",
            Variavel::ValorDesconto => "valor_desconto",
            Variavel::PercentualDesconto => "percentual_desconto",
        }
    }

    fn from_nome(nome: &str) -> Option<Self> {
        Self::TODAS.into_iter().find(|v| v.nome() == nome)
    }
}

/// Valores de entrada de uma avaliação.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariaveisCalculo {
    pub total_fatura: Decimal,
    pub iluminacao_publica: Decimal,
    pub outros_valores: Decimal,
    pub fatura_concessionaria: Decimal,
    pub valor_desconto: Decimal,
    pub percentual_desconto: Decimal,
}

impl VariaveisCalculo {
    fn get(&self, v: Variavel) -> Decimal {
        match v {
            Variavel::TotalFatura => self.total_fatura,
            Variavel::IluminacaoPublica => self.iluminacao_publica,
            Variavel::OutrosValores => self.outros_valores,
            Variavel::FaturaConcessionaria => self.fatura_concessionaria,
            Variavel::ValorDesconto => self.valor_desconto,
            Variavel::PercentualDesconto => self.percentual_desconto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Num(Decimal),
    Var(Variavel),
    Neg(Box<Expr>),
    Bin(Op, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Decimal),
    Ident(String),
    Op(Op),
    LParen,
    RParen,
}

/// Fórmula já analisada.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    fonte: String,
    expr: Expr,
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fonte)
    }
}

fn tokenize(fonte: &str) -> Result<Vec<Token>, AppError> {
    let chars: Vec<char> = fonte.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' | '-' | '*' | '/' | '(' | ')' => {
                tokens.push(match c {
                    '+' => Token::Op(Op::Add),
                    '-' => Token::Op(Op::Sub),
                    '*' => Token::Op(Op::Mul),
                    '/' => Token::Op(Op::Div),
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            '0'..='9' | '.' => {
                let inicio = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let texto: String = chars[inicio..i].iter().collect();
                let valor = texto
                    .parse::<Decimal>()
                    .map_err(|_| AppError::InvalidFormula(format!("número inválido '{}'", texto)))?;
                tokens.push(Token::Num(valor));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let inicio = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[inicio..i].iter().collect()));
            }
            outro => {
                return Err(AppError::InvalidFormula(format!(
                    "caractere inesperado '{}' na posição {}",
                    outro, i
                )));
            }
        }
    }

    Ok(tokens)
}

/// Tamanho máximo da fonte de uma fórmula.
pub const MAX_TAMANHO: usize = 500;

/// Profundidade máxima de parênteses e sinais unários encadeados.
const MAX_ANINHAMENTO: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    profundidade: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<Expr, AppError> {
        let mut esquerda = self.term()?;
        while let Some(Token::Op(op @ (Op::Add | Op::Sub))) = self.peek().cloned() {
            self.pos += 1;
            let direita = self.term()?;
            esquerda = Expr::Bin(op, Box::new(esquerda), Box::new(direita));
        }
        Ok(esquerda)
    }

    fn term(&mut self) -> Result<Expr, AppError> {
        let mut esquerda = self.factor()?;
        while let Some(Token::Op(op @ (Op::Mul | Op::Div))) = self.peek().cloned() {
            self.pos += 1;
            let direita = self.factor()?;
            esquerda = Expr::Bin(op, Box::new(esquerda), Box::new(direita));
        }
        Ok(esquerda)
    }

    fn factor(&mut self) -> Result<Expr, AppError> {
        if self.profundidade >= MAX_ANINHAMENTO {
            return Err(AppError::InvalidFormula("expressão aninhada demais".into()));
        }
        self.profundidade += 1;
        let resultado = self.primary();
        self.profundidade -= 1;
        resultado
    }

    fn primary(&mut self) -> Result<Expr, AppError> {
        match self.next() {
            Some(Token::Op(Op::Sub)) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Token::Op(Op::Add)) => self.factor(),
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(nome)) => Variavel::from_nome(&nome)
                .map(Expr::Var)
                .ok_or_else(|| AppError::InvalidFormula(format!("variável desconhecida '{}'", nome))),
            Some(Token::LParen) => {
                let dentro = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(dentro),
                    _ => Err(AppError::InvalidFormula("parêntese não fechado".into())),
                }
            }
            Some(outro) => Err(AppError::InvalidFormula(format!("token inesperado {:?}", outro))),
            None => Err(AppError::InvalidFormula("expressão incompleta".into())),
        }
    }
}

fn eval(expr: &Expr, vars: &VariaveisCalculo) -> Result<Decimal, AppError> {
    match expr {
        Expr::Num(n) => Ok(*n),
        Expr::Var(v) => Ok(vars.get(*v)),
        Expr::Neg(inner) => Ok(-eval(inner, vars)?),
        Expr::Bin(op, a, b) => {
            let a = eval(a, vars)?;
            let b = eval(b, vars)?;
            let resultado = match op {
                Op::Add => a.checked_add(b),
                Op::Sub => a.checked_sub(b),
                Op::Mul => a.checked_mul(b),
                Op::Div => {
                    if b.is_zero() {
                        return Err(AppError::InvalidFormula("divisão por zero".into()));
                    }
                    a.checked_div(b)
                }
            };
            resultado.ok_or_else(|| AppError::InvalidFormula("estouro numérico".into()))
        }
    }
}

fn collect_vars(expr: &Expr, out: &mut Vec<Variavel>) {
    match expr {
        Expr::Num(_) => {}
        Expr::Var(v) => {
            if !out.contains(v) {
                out.push(*v);
            }
        }
        Expr::Neg(inner) => collect_vars(inner, out),
        Expr::Bin(_, a, b) => {
            collect_vars(a, out);
            collect_vars(b, out);
        }
    }
}

impl Formula {
    pub fn parse(fonte: &str) -> Result<Self, AppError> {
        if fonte.len() > MAX_TAMANHO {
            return Err(AppError::InvalidFormula(format!(
                "fórmula com mais de {} caracteres",
                MAX_TAMANHO
            )));
        }
        let tokens = tokenize(fonte)?;
        if tokens.is_empty() {
            return Err(AppError::InvalidFormula("fórmula vazia".into()));
        }
        let mut parser = Parser { tokens, pos: 0, profundidade: 0 };
        let expr = parser.expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(AppError::InvalidFormula(format!(
                "conteúdo inesperado após a posição {}",
                parser.pos
            )));
        }
        Ok(Self { fonte: fonte.trim().to_string(), expr })
    }

    /// Fórmula de desconto: não pode depender do próprio desconto.
    pub fn parse_desconto(fonte: &str) -> Result<Self, AppError> {
        let formula = Self::parse(fonte)?;
        if formula.variables().contains(&Variavel::ValorDesconto) {
            return Err(AppError::InvalidFormula(
                "a fórmula de desconto não pode usar valor_desconto".into(),
            ));
        }
        Ok(formula)
    }

    pub fn variables(&self) -> Vec<Variavel> {
        let mut out = Vec::new();
        collect_vars(&self.expr, &mut out);
        out
    }

    pub fn evaluate(&self, vars: &VariaveisCalculo) -> Result<Decimal, AppError> {
        eval(&self.expr, vars)
    }
}

/// Resultado dos dois cálculos de um template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultadoCalculo {
    pub valor_desconto: Decimal,
    pub valor_assinatura: Decimal,
}

/// Avalia desconto e, com ele, a assinatura. Valores em centavos.
pub fn calcular(
    formula_desconto: &str,
    formula_assinatura: &str,
    mut vars: VariaveisCalculo,
) -> Result<ResultadoCalculo, AppError> {
    let desconto = Formula::parse_desconto(formula_desconto)?.evaluate(&vars)?.round_dp(2);
    vars.valor_desconto = desconto;
    let assinatura = Formula::parse(formula_assinatura)?.evaluate(&vars)?.round_dp(2);
    Ok(ResultadoCalculo { valor_desconto: desconto, valor_assinatura: assinatura })
}
