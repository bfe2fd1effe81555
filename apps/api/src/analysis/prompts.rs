// Prompt constants for CV analysis.
// The preamble is opaque configuration text: the pipeline interpolates it and
// never parses it. Reuses the JSON-only fragment from llm_client::prompts.

use chrono::{Datelike, NaiveDate};

use crate::analysis::request::RequestContext;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Date the model reasons from, so experience recency is judged the same way on every request.
pub const DEFAULT_CURRENT_DATE: &str = "2026-02-06";

/// Role framing and evaluation policy.
/// Replace: {current_date}, {current_year}, {previous_year}
pub const ANALYSIS_PREAMBLE_TEMPLATE: &str = r#"You are the lead technical investigator and strategic recruiting consultant for the group. Today's date is {current_date}.
Your task: analyse the attached CV with extreme precision relative to today's date and produce a professional, logically rigorous report.

PROCESSING RULES:
1. TIME AWARENESS: The current year is {current_year}. Any position that started in {previous_year} or later and has no end date is ongoing.
2. INVESTIGATION: Cross-check graduation years against employment dates. Report every chronological gap or logical contradiction in `discrepancies`, quoting the CV text that reveals it.
3. STRATEGIC EVALUATION:
   - Real strengths: only skills that genuinely set the candidate apart (specialised experience, professional certifications, job stability), each with its impact.
   - Gaps: state candidly and professionally what the candidate lacks for this role, each with how to close it.
   - Smart alternatives: suggest other roles the candidate is actually better suited for, based on demonstrated skills.
4. STANCE: Be strict when scoring operational risk (operationalRisk) and creative with alternatives.
5. LANGUAGE: Write every free-text value in concise, professional Modern Standard Arabic.

FIELD GUIDE:
- matchScore: fit for the target role, integer 0-100.
- suitabilityLabel: very short label (e.g. "مطابق تماماً", "يحتاج تطوير", "غير مناسب").
- meritJudgment: detailed judgment of whether the candidate merits the role, and why.
- operationalRisk: operational risk indicator, integer 0-100, based on job stability and data integrity.
- scorecard: integer 0-100 per dimension.
- strengths: 3 real strengths with their impact.
- weaknesses: 3 gaps with how to address each.
- alternatives: 2-3 alternative roles with an integer 0-100 match score each.
- salaryBenchmark: suggested salary with analysis.
- interviewGuide: 4 strategic questions with their goals.
All scores are integers from 0 to 100, never fractions."#;

/// Renders the preamble for a given date anchor.
pub fn render_preamble(current_date: NaiveDate) -> String {
    let year = current_date.year();
    ANALYSIS_PREAMBLE_TEMPLATE
        .replace("{current_date}", &current_date.format("%Y-%m-%d").to_string())
        .replace("{current_year}", &year.to_string())
        .replace("{previous_year}", &(year - 1).to_string())
}

/// Builds the single instruction block sent with the document.
/// Caller text is appended, never substituted into templates.
pub fn build_instruction(preamble: &str, ctx: &RequestContext) -> String {
    format!(
        "{preamble}\n\n{JSON_ONLY_INSTRUCTION}\n\nAdditional context: {}\nTarget role: {}\nCandidate name: {}",
        ctx.notes().unwrap_or_default(),
        ctx.target_role(),
        ctx.candidate_name().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDate {
        NaiveDate::parse_from_str(DEFAULT_CURRENT_DATE, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_preamble_carries_date_anchor() {
        let preamble = render_preamble(anchor());
        assert!(preamble.contains("Today's date is 2026-02-06"));
        assert!(preamble.contains("The current year is 2026"));
        assert!(preamble.contains("started in 2025"));
        assert!(!preamble.contains("{current_"));
        assert!(!preamble.contains("{previous_year}"));
    }

    #[test]
    fn test_preamble_requests_chronology_cross_check() {
        let preamble = render_preamble(anchor());
        assert!(preamble.contains("graduation years against employment dates"));
    }

    #[test]
    fn test_instruction_interpolates_context() {
        let ctx = RequestContext::new("Project Manager")
            .unwrap()
            .with_candidate_name("Khalid")
            .with_notes("Relocating from Riyadh");
        let instruction = build_instruction(&render_preamble(anchor()), &ctx);

        assert!(instruction.contains("Target role: Project Manager"));
        assert!(instruction.contains("Candidate name: Khalid"));
        assert!(instruction.contains("Additional context: Relocating from Riyadh"));
        assert!(instruction.contains(JSON_ONLY_INSTRUCTION));
    }

    #[test]
    fn test_placeholders_in_notes_are_not_expanded() {
        let ctx = RequestContext::new("Nurse")
            .unwrap()
            .with_notes("{target_role} {current_date}");
        let instruction = build_instruction("P", &ctx);
        assert!(instruction.contains("Additional context: {target_role} {current_date}"));
    }

    #[test]
    fn test_instruction_with_only_required_context() {
        let ctx = RequestContext::new("Driver").unwrap();
        let instruction = build_instruction("PREAMBLE", &ctx);
        assert!(instruction.starts_with("PREAMBLE\n\n"));
        assert!(instruction.ends_with("Target role: Driver\nCandidate name: "));
    }
}
