//! Prompt text for the oracle
//!
//! Each builder returns a (system, user) pair. The response contract is the
//! same everywhere: a JSON array of {original, corrected, explanation}
//! objects where `original` is a verbatim substring of the supplied text.

use super::{OracleRequest, Scope};
use crate::session::StructureKind;

const RESPONSE_CONTRACT: &str = r#"Respond with ONLY a JSON array. Each element:
{"original": "<verbatim substring of the text>", "corrected": "<proposed replacement>", "explanation": "<one short sentence>"}

Rules:
- "original" must be copied character-for-character from the text, or it cannot be applied.
- Return an empty array [] if there is nothing to suggest.
- No markdown fences, no commentary outside the JSON."#;

fn structure_convention(structure: StructureKind) -> &'static str {
    match structure {
        StructureKind::Loose => {
            "The piece is free verse: line lengths and stanza shapes may vary freely."
        }
        StructureKind::Strict => {
            "The piece follows a fixed form: keep meter and stanza structure consistent."
        }
    }
}

fn rhyme_clause(enforce_rhyme: bool) -> &'static str {
    if enforce_rhyme {
        "Preserve and, where broken, restore the rhyme scheme."
    } else {
        "Do not impose a rhyme scheme."
    }
}

fn exclusion_clause(excluded: &[String]) -> String {
    if excluded.is_empty() {
        return String::new();
    }
    let list = excluded
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "\nThe writer has already rejected these phrasings; do not propose any of them, \
         in whole or in part: {}.",
        list
    )
}

/// Full-document request for one (or both) suggestion tracks
pub fn review_prompt(request: &OracleRequest) -> (String, String) {
    let track = match request.scope {
        Scope::Grammar => {
            "Find grammar, agreement, and structural errors only. \
             Ignore style and word choice."
        }
        Scope::Tone => {
            "Find tone and style improvements only. \
             The text is already grammatically clean; do not flag grammar."
        }
        Scope::Both => "Find grammar errors first, then tone and style improvements.",
    };

    let system = format!(
        "You are an editor assisting a writer working on a poem or short text.\n\
         {}\n{}\n{}\n\n{}",
        track,
        structure_convention(request.structure),
        rhyme_clause(request.enforce_rhyme),
        RESPONSE_CONTRACT
    );

    let user = format!(
        "Intended tone: {}.{}\n\nText:\n{}",
        request.tone,
        exclusion_clause(&request.excluded_phrases),
        request.text
    );

    (system, user)
}

/// Single-span request: propose one fresh alternative for a phrase the
/// writer did not like, avoiding everything already rejected.
pub fn resuggest_prompt(request: &OracleRequest) -> (String, String) {
    let system = format!(
        "You are an editor assisting a writer. The writer wants a different \
         suggestion for one phrase of their piece. Propose exactly one \
         alternative for the given phrase, as a single-element JSON array \
         whose \"original\" is the phrase verbatim.\n{}\n{}\n\n{}",
        structure_convention(request.structure),
        rhyme_clause(request.enforce_rhyme),
        RESPONSE_CONTRACT
    );

    let user = format!(
        "Intended tone: {}.{}\n\nPhrase:\n{}",
        request.tone,
        exclusion_clause(&request.excluded_phrases),
        request.text
    );

    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(scope: Scope, excluded: Vec<String>) -> OracleRequest {
        OracleRequest {
            text: "triste".to_string(),
            tone: "Melancholic".to_string(),
            structure: StructureKind::Loose,
            enforce_rhyme: false,
            scope,
            excluded_phrases: excluded,
        }
    }

    #[test]
    fn test_review_prompt_carries_tone_and_text() {
        let (_, user) = review_prompt(&request(Scope::Grammar, vec![]));
        assert!(user.contains("Melancholic"));
        assert!(user.contains("triste"));
    }

    #[test]
    fn test_grammar_scope_excludes_style() {
        let (system, _) = review_prompt(&request(Scope::Grammar, vec![]));
        assert!(system.contains("Ignore style"));
    }

    #[test]
    fn test_exclusions_listed_in_user_prompt() {
        let (_, user) = resuggest_prompt(&request(
            Scope::Tone,
            vec!["soturno".to_string(), "sombrio".to_string()],
        ));
        assert!(user.contains("\"soturno\""));
        assert!(user.contains("\"sombrio\""));
    }

    #[test]
    fn test_no_exclusion_clause_when_empty() {
        let (_, user) = review_prompt(&request(Scope::Tone, vec![]));
        assert!(!user.contains("already rejected"));
    }
}
