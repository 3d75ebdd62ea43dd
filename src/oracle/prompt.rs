//! Prompt construction for the oracle.
//!
//! All user-facing prompt text is Spanish — the journal's voice.  Nothing
//! here is configurable; prompts are part of the product, not of the
//! deployment.

use crate::journal::{DreamContext, UserProfile};

/// Required markdown structure of an interpretation, appended to every
/// analysis prompt.
const INTERPRETATION_STRUCTURE: &str = "\
INSTRUCCIONES:
Provee una interpretación profunda y estructurada en formato Markdown.
IMPORTANTE: Usa encabezados de nivel 3 (###) para separar visualmente las secciones.

ESTRUCTURA REQUERIDA:

### 🧠 Interpretación Personal y Psicológica
(Usa conceptos de Freud, Jung y psicoanálisis moderno para analizar emociones y familia).

### 🌌 Interpretación Universal y Metafísica
(Usa simbología ancestral, arquetipos, y conceptos espirituales/religiosos).

### 🔮 Perspectiva Futurista
(Basado en la hora, fecha y simbolismo, ofrece una visión profética, advertencia o guía).

El tono debe ser misterioso, artístico pero claro y útil.";

/// Build the dream-interpretation prompt from the dreamer's profile and the
/// dream under analysis.
pub fn interpretation(profile: &UserProfile, dream: &DreamContext) -> String {
    format!(
        "Actúa como un experto onírico surrealista y profundo.\n\
         Analiza el siguiente sueño.\n\n\
         CONTEXTO DEL SOÑADOR:\n\
         Nombre: {}\n\
         Edad: {}\n\
         Ciudad Natal: {}\n\
         Fecha de Análisis: {}\n\n\
         DETALLES DEL SUEÑO:\n\
         Fecha del sueño: {}\n\
         Hora del sueño: {}\n\
         Relato: {}\n\
         Notas adicionales: {}\n\n\
         {}",
        profile.full_name,
        profile.age,
        profile.birth_city,
        profile.session_date,
        dream.dream_date,
        dream.dream_time,
        dream.narrative,
        dream.additional_notes,
        INTERPRETATION_STRUCTURE,
    )
}

/// Build the grounded symbolism query.
pub fn symbolism(query: &str) -> String {
    format!(
        "Investiga el significado simbólico actual y cultural de: {query}. \
         Provee un resumen breve."
    )
}

/// Build the image-generation prompt.  The style prefix keeps generations
/// inside the journal's surrealist register.
pub fn dream_image(description: &str) -> String {
    format!("Surrealist dream art: {description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Ana".into(),
            age: 30,
            birth_city: "Lima".into(),
            session_date: "2024-01-02".into(),
        }
    }

    fn dream() -> DreamContext {
        DreamContext {
            narrative: "Volaba sobre un océano rojo".into(),
            dream_date: "2024-01-01".into(),
            dream_time: "03:00".into(),
            additional_notes: "desperté agitada".into(),
            image: None,
        }
    }

    #[test]
    fn interpretation_carries_profile_and_dream() {
        let p = interpretation(&profile(), &dream());
        assert!(p.contains("Nombre: Ana"));
        assert!(p.contains("Edad: 30"));
        assert!(p.contains("Ciudad Natal: Lima"));
        assert!(p.contains("Relato: Volaba sobre un océano rojo"));
        assert!(p.contains("Notas adicionales: desperté agitada"));
    }

    #[test]
    fn interpretation_demands_the_three_sections() {
        let p = interpretation(&profile(), &dream());
        assert!(p.contains("### 🧠 Interpretación Personal y Psicológica"));
        assert!(p.contains("### 🌌 Interpretación Universal y Metafísica"));
        assert!(p.contains("### 🔮 Perspectiva Futurista"));
    }

    #[test]
    fn symbolism_embeds_the_query() {
        assert!(symbolism("gato negro").contains("gato negro"));
    }

    #[test]
    fn image_prompt_keeps_surrealist_prefix() {
        assert_eq!(
            dream_image("un reloj derritiéndose"),
            "Surrealist dream art: un reloj derritiéndose"
        );
    }
}
