// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every extraction prompt so the model leaves gaps instead of guessing.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only report values that are stated or unambiguously implied by the text. \
    If a field is not supported by the text, omit it entirely. \
    Never invent salary figures, company names, or locations.";
