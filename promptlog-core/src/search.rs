use crate::record::PromptRecord;

/// Checks whether any field of `prompt` contains `term`, ignoring case and surrounding whitespace.
///
/// An empty term matches every prompt.
pub fn matches<P: PromptRecord>(prompt: &P, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    prompt
        .searchable_values()
        .iter()
        .any(|value| value.trim().to_lowercase().contains(&needle))
}

pub fn search<'a, P: PromptRecord>(prompts: &'a [P], term: &str) -> Vec<&'a P> {
    prompts.iter().filter(|prompt| matches(*prompt, term)).collect()
}
