//! # scriptrs User-Facing Strings
//!
//! File: cli/src/core/i18n.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Banners, notices, and status labels shown to the user are looked up here
//! instead of being hard-coded at the call site. Six languages are bundled;
//! anything else falls back to English.
//!
//! The active locale comes from `[display] locale` in the configuration or,
//! when unset, from the base language of `LANG` (`es_ES.UTF-8` → `es`).
//!
use serde::Deserialize;
use std::fmt;

/// Languages with bundled translations.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
    Fr,
    De,
    Pt,
    It,
}

impl Locale {
    /// Parses a language tag such as `es`, `pt-BR` or `de_DE.UTF-8`.
    /// Only the base language is considered. Returns `None` for languages
    /// without a bundled translation.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let base = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match base.as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            "fr" => Some(Locale::Fr),
            "de" => Some(Locale::De),
            "pt" => Some(Locale::Pt),
            "it" => Some(Locale::It),
            _ => None,
        }
    }

    /// Locale derived from the `LANG` environment variable, English otherwise.
    pub fn from_env() -> Self {
        std::env::var("LANG")
            .ok()
            .and_then(|lang| Self::from_tag(&lang))
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Fr => "fr",
            Locale::De => "de",
            Locale::Pt => "pt",
            Locale::It => "it",
        };
        f.write_str(tag)
    }
}

/// Keys for every translated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Executing,
    ProcessCompleted,
    ProcessTerminated,
    ProcessSignalled,
    ProcessStopped,
    Error,
    HistoryCleared,
    Running,
    Completed,
    Failed,
}

/// Returns the translation of `message` in `locale`.
pub fn tr(locale: Locale, message: Message) -> &'static str {
    use Locale::*;
    use Message::*;
    match (message, locale) {
        (Executing, En) => "Executing",
        (Executing, Es) => "Ejecutando",
        (Executing, Fr) => "Exécution",
        (Executing, De) => "Ausführung",
        (Executing, Pt) => "Executando",
        (Executing, It) => "Esecuzione",

        (ProcessCompleted, En) => "Process completed with code",
        (ProcessCompleted, Es) => "Proceso completado con código",
        (ProcessCompleted, Fr) => "Processus terminé avec le code",
        (ProcessCompleted, De) => "Prozess abgeschlossen mit Code",
        (ProcessCompleted, Pt) => "Processo concluído com código",
        (ProcessCompleted, It) => "Processo completato con codice",

        (ProcessTerminated, En) => "Process terminated with code",
        (ProcessTerminated, Es) => "Proceso terminó con código",
        (ProcessTerminated, Fr) => "Processus terminé avec le code",
        (ProcessTerminated, De) => "Prozess beendet mit Code",
        (ProcessTerminated, Pt) => "Processo terminado com código",
        (ProcessTerminated, It) => "Processo terminato con codice",

        (ProcessSignalled, En) => "Process terminated by signal",
        (ProcessSignalled, Es) => "Proceso terminado por señal",
        (ProcessSignalled, Fr) => "Processus arrêté par un signal",
        (ProcessSignalled, De) => "Prozess durch Signal beendet",
        (ProcessSignalled, Pt) => "Processo terminado por sinal",
        (ProcessSignalled, It) => "Processo terminato da un segnale",

        (ProcessStopped, En) => "Process stopped by user",
        (ProcessStopped, Es) => "Proceso detenido por el usuario",
        (ProcessStopped, Fr) => "Processus arrêté par l'utilisateur",
        (ProcessStopped, De) => "Prozess vom Benutzer gestoppt",
        (ProcessStopped, Pt) => "Processo interrompido pelo usuário",
        (ProcessStopped, It) => "Processo interrotto dall'utente",

        (Error, En) => "Error",
        (Error, Es) => "Error",
        (Error, Fr) => "Erreur",
        (Error, De) => "Fehler",
        (Error, Pt) => "Erro",
        (Error, It) => "Errore",

        (HistoryCleared, En) => "History cleared",
        (HistoryCleared, Es) => "Historial limpiado",
        (HistoryCleared, Fr) => "Historique effacé",
        (HistoryCleared, De) => "Verlauf gelöscht",
        (HistoryCleared, Pt) => "Histórico limpo",
        (HistoryCleared, It) => "Cronologia cancellata",

        (Running, En) => "Running",
        (Running, Es) => "En ejecución",
        (Running, Fr) => "En cours",
        (Running, De) => "Läuft",
        (Running, Pt) => "Executando",
        (Running, It) => "In esecuzione",

        (Completed, En) => "Completed",
        (Completed, Es) => "Completado",
        (Completed, Fr) => "Terminé",
        (Completed, De) => "Abgeschlossen",
        (Completed, Pt) => "Concluído",
        (Completed, It) => "Completato",

        (Failed, En) => "Failed",
        (Failed, Es) => "Fallido",
        (Failed, Fr) => "Échoué",
        (Failed, De) => "Fehlgeschlagen",
        (Failed, Pt) => "Falhou",
        (Failed, It) => "Fallito",
    }
}
