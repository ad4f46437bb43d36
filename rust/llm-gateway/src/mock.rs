//! Static fallback content used when no provider API key is configured.
//!
//! The downstream stages still run against this output, so the gates
//! (citation, grammar, readability) continue to exercise real logic even
//! in an environment with no external LLM access.

use crate::types::{GenerationResult, GrammarCheckResult, WritingMode};

pub fn outline(prompt: &str, mode: WritingMode) -> GenerationResult {
    let body = match mode {
        WritingMode::Academic => format!(
            "# Outline: {prompt}\n\n\
             ## 1. Introduction\n- Background\n- Motivation\n- Thesis statement\n\n\
             ## 2. Body\n### 2.1 First point\n- Supporting detail\n### 2.2 Second point\n- Supporting detail\n### 2.3 Third point\n- Supporting detail\n\n\
             ## 3. Conclusion\n- Summary\n- Implications\n- Future work\n\n\
             ## References\n[to be added]"
        ),
        WritingMode::Blog => format!(
            "# {prompt}\n\n## Hook\n\n## Main points\n- Point one\n- Point two\n- Point three\n\n## Takeaway"
        ),
        WritingMode::Social => format!("# {prompt}\n\n- Key message\n- Call to action"),
    };
    GenerationResult {
        content: body,
        tokens_used: 0,
    }
}

pub fn content(outline: &str, mode: WritingMode, target_word_count: u32) -> GenerationResult {
    let title = outline
        .lines()
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim())
        .unwrap_or("Untitled document");

    let register = match mode {
        WritingMode::Academic => "scholarly",
        WritingMode::Blog => "conversational",
        WritingMode::Social => "concise",
    };

    let body = format!(
        "# {title}\n\n\
         ## Introduction\n\n\
         This is a {target_word_count}-word {register} draft generated from the outline above. \
         It establishes the scope of the topic and previews the points that follow.\n\n\
         ## Body\n\n\
         ### First point\n\n\
         The first point is developed here with supporting detail [1].\n\n\
         ### Second point\n\n\
         The second point builds on the first and introduces a complementary perspective [2].\n\n\
         ### Third point\n\n\
         The third point draws the preceding discussion together.\n\n\
         ## Conclusion\n\n\
         Taken together, these points support the thesis introduced above and suggest directions \
         for further work.\n\n\
         ## References\n\n\
         [1] Example Author. Representative Finding. Journal of Examples, 2023.\n\
         [2] Another Author, Second Author. Framework and Application. Example Press, 2024."
    );

    GenerationResult {
        content: body,
        tokens_used: 0,
    }
}

pub fn check_grammar(content: &str) -> GrammarCheckResult {
    let word_count = content.split_whitespace().count() as u32;
    let errors = (word_count / 500).min(10);
    let suggestions = if errors > 0 {
        vec![
            "Consider varying sentence structure.".to_string(),
            "Double-check punctuation around clauses.".to_string(),
        ]
    } else {
        Vec::new()
    };

    GrammarCheckResult {
        errors,
        corrected_content: content.to_string(),
        suggestions,
        tokens_used: 0,
    }
}
