// Shared prompt fragments. Each service that needs LLM calls keeps its own
// prompts.rs alongside it; only cross-cutting fragments live here.

/// Instruction appended to every structured-output prompt.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only, conforming exactly to the \
    declared response schema. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
