// src/common/notifier.rs

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NivelNotificacao {
    Sucesso,
    Aviso,
    Erro,
}

/// Canal de avisos ao operador, injetado em cada operação de serviço.
pub trait Notifier: Send + Sync {
    fn notify(&self, nivel: NivelNotificacao, mensagem: &str);

    fn success(&self, mensagem: &str) {
        self.notify(NivelNotificacao::Sucesso, mensagem);
    }

    fn warn(&self, mensagem: &str) {
        self.notify(NivelNotificacao::Aviso, mensagem);
    }

    fn error(&self, mensagem: &str) {
        self.notify(NivelNotificacao::Erro, mensagem);
    }
}

/// Implementação de produção: as notificações vão para o log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, nivel: NivelNotificacao, mensagem: &str) {
        match nivel {
            NivelNotificacao::Sucesso => tracing::info!(target: "notificacao", "✅ {}", mensagem),
            NivelNotificacao::Aviso => tracing::warn!(target: "notificacao", "⚠️ {}", mensagem),
            NivelNotificacao::Erro => tracing::error!(target: "notificacao", "🔥 {}", mensagem),
        }
    }
}

/// Guarda as notificações para inspeção nos testes.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub mensagens: std::sync::Mutex<Vec<(NivelNotificacao, String)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn count(&self, nivel: NivelNotificacao) -> usize {
        self.mensagens
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == nivel)
            .count()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, nivel: NivelNotificacao, mensagem: &str) {
        self.mensagens.lock().unwrap().push((nivel, mensagem.to_string()));
    }
}
