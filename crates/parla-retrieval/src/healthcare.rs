//! Emergency detection and healthcare guidance.

use parla_core::{MedicalContext, RetrievedDocument};

/// Phrases that mark a statement as a medical emergency.
pub const EMERGENCY_PHRASES: &[&str] = &[
    "chest pain",
    "difficulty breathing",
    "unconscious",
    "severe bleeding",
];

/// Alert surfaced when an emergency phrase is detected.
pub const EMERGENCY_ALERT: &str = "CONTACT EMERGENCY SERVICES IMMEDIATELY";

/// Context used when no knowledge matches the statement.
pub const FALLBACK_MEDICAL_CONTEXT: &str = "Consult with healthcare professional";

/// General guidance attached to every matched healthcare context.
pub const RECOMMENDATIONS: &[&str] = &[
    "Consult with a licensed healthcare provider",
    "Monitor symptoms for any changes",
    "Stay hydrated and get adequate rest",
];

/// Case-insensitive substring match against [`EMERGENCY_PHRASES`].
pub fn is_emergency(statement: &str) -> bool {
    let lower = statement.to_lowercase();
    EMERGENCY_PHRASES.iter().any(|p| lower.contains(p))
}

/// Assemble the medical context for a statement from its ranked documents.
pub fn medical_context(symptom: &str, docs: &[RetrievedDocument]) -> MedicalContext {
    let emergency = is_emergency(symptom);
    match docs.first() {
        Some(best) => MedicalContext {
            symptom: symptom.to_string(),
            summary: best.content.clone(),
            recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            emergency,
        },
        None => MedicalContext {
            symptom: symptom.to_string(),
            summary: FALLBACK_MEDICAL_CONTEXT.to_string(),
            recommendations: Vec::new(),
            emergency,
        },
    }
}
