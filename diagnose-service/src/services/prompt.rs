//! Prompt construction for bicycle repair diagnoses.
//!
//! The system instruction is rendered once at startup from the selected
//! [`PromptProfile`] and the configured labor rate. Only the user prompt is
//! built per request.

use std::fmt;
use std::str::FromStr;

/// Which hand-authored system instruction the service sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptProfile {
    /// Customer-facing answer in three headed sections with a cost range.
    #[default]
    Werkstatt,
    /// Short answer: likely cause, recommended work, rough AW estimate.
    Kompakt,
}

impl FromStr for PromptProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "werkstatt" => Ok(PromptProfile::Werkstatt),
            "kompakt" => Ok(PromptProfile::Kompakt),
            other => Err(format!(
                "unknown prompt profile '{}', expected 'werkstatt' or 'kompakt'",
                other
            )),
        }
    }
}

impl fmt::Display for PromptProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptProfile::Werkstatt => write!(f, "werkstatt"),
            PromptProfile::Kompakt => write!(f, "kompakt"),
        }
    }
}

/// Immutable prompt material shared by all requests.
#[derive(Debug, Clone)]
pub struct DiagnosisPrompt {
    profile: PromptProfile,
    aw_euro: u32,
    system_instruction: String,
}

impl DiagnosisPrompt {
    pub fn new(profile: PromptProfile, aw_euro: u32) -> Self {
        let system_instruction = match profile {
            PromptProfile::Werkstatt => werkstatt_instruction(aw_euro),
            PromptProfile::Kompakt => kompakt_instruction(aw_euro),
        };

        Self {
            profile,
            aw_euro,
            system_instruction,
        }
    }

    pub fn profile(&self) -> PromptProfile {
        self.profile
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Render the per-request prompt. `problem` is embedded verbatim.
    pub fn user_prompt(&self, problem: &str) -> String {
        match self.profile {
            PromptProfile::Werkstatt => format!(
                "Ein Kunde hat folgendes Problem mit seinem Fahrrad beschrieben:\n\
                 \"{problem}\"\n\
                 \n\
                 Gehe davon aus, dass es sich um ein normales Alltagsrad oder E‑Bike handeln kann.\n\
                 Antworte gemäß der vorgegebenen Struktur mit den drei Abschnitten:\n\
                 \"Vermutete Fehlerdiagnose\", \"Empfohlene Arbeiten in der Fahrradwerkstatt\"\n\
                 und \"Grobe Einschätzung für Inspektion & Arbeitsaufwand\".\n\
                 \n\
                 Berücksichtige bei der Kostenspanne, dass ein Arbeitswert (AW) {rate} € kostet.\n\
                 Gib die Kostenspanne immer deutlich als unverbindliche Schätzung an\n\
                 (z.B. \"ca.\" / \"etwa\" und \"ohne Teile\").",
                problem = problem,
                rate = self.aw_euro,
            ),
            PromptProfile::Kompakt => format!(
                "Problembeschreibung des Kunden:\n\
                 \"{problem}\"\n\
                 \n\
                 Nenne kurz die wahrscheinlichste Ursache, die empfohlene Arbeit und eine \
                 grobe AW-Spanne (1 AW = {rate} €, ohne Teile).",
                problem = problem,
                rate = self.aw_euro,
            ),
        }
    }
}

fn werkstatt_instruction(aw_euro: u32) -> String {
    format!(
        "Du bist ein erfahrener Zweiradmechaniker in einer kleinen Fahrradwerkstatt im Hunsrück.\n\
         Der Nutzer beschreibt ein Problem an seinem Fahrrad.\n\
         \n\
         Antworte immer auf Deutsch und richte dich an Kundinnen und Kunden, nicht an andere Mechaniker.\n\
         \n\
         Struktur deiner Antwort IMMER in drei Abschnitten mit klaren Überschriften:\n\
         \n\
         1. Vermutete Fehlerdiagnose\n\
         \x20  - 2–4 mögliche Ursachen in einfachen Sätzen.\n\
         \n\
         2. Empfohlene Arbeiten in der Fahrradwerkstatt\n\
         \x20  - Stichpunktartige Beschreibung typischer Arbeitsschritte\n\
         \x20    (z.B. \"Bremsbeläge prüfen und ggf. ersetzen\", \"Schaltzug ersetzen und Schaltung neu einstellen\").\n\
         \n\
         3. Grobe Einschätzung für Inspektion & Arbeitsaufwand\n\
         \x20  - Schätze eine SPANNE an Arbeitswerten (z.B. \"ca. 3–6 AW\").\n\
         \x20  - Rechne diese Spanne mit einem Arbeitswert von {rate} € pro AW in eine grobe, unverbindliche Kostenspanne um\n\
         \x20    (z.B. \"entspricht etwa {low}–{high} € Arbeitslohn, ohne Teile\").\n\
         \x20  - Betone ausdrücklich, dass die endgültige Einschätzung erst nach Sichtprüfung in der Werkstatt möglich ist.\n\
         \n\
         WICHTIG:\n\
         - Nenne nur Spannen (\"ca.\", \"etwa\") und keine festen, verbindlichen Preise.\n\
         - Erwähne immer, dass Ersatzteile und ggf. zusätzliche Arbeiten noch dazukommen können.\n\
         - Wecke keine falschen Erwartungen – bei Unsicherheit musst du erwähnen,\n\
         \x20 dass eine persönliche Inspektion in der Werkstatt RadFachWerk in Dörrebach nötig ist.\n\
         \n\
         Verwende, wo es sinnvoll ist, Begriffe wie Fahrradreparatur, Fehlerdiagnose und Inspektion,\n\
         aber nur natürlich im Text, nicht künstlich gehäuft.",
        rate = aw_euro,
        low = 3 * aw_euro,
        high = 6 * aw_euro,
    )
}

fn kompakt_instruction(aw_euro: u32) -> String {
    format!(
        "Du bist Zweiradmechaniker in der Fahrradwerkstatt RadFachWerk in Dörrebach.\n\
         Antworte auf Deutsch, kurz und verständlich für Kundinnen und Kunden.\n\
         Gib eine vermutete Ursache, die empfohlene Arbeit und eine grobe Spanne an \
         Arbeitswerten an (1 AW = {rate} €).\n\
         Nenne nur unverbindliche Spannen ohne Teile und weise darauf hin, dass eine \
         Sichtprüfung in der Werkstatt nötig ist.",
        rate = aw_euro,
    )
}
