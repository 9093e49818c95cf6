use parla_core::RetrievedDocument;

/// Prefix retrieved context onto a generator input.
///
/// Returns `input` unchanged when there is no context.
pub fn augment_prompt(docs: &[RetrievedDocument], input: &str) -> String {
    if docs.is_empty() {
        return input.to_string();
    }
    let mut context = String::from("Relevant Context:\n");
    for doc in docs {
        context.push_str("- ");
        context.push_str(&doc.content);
        context.push('\n');
    }
    format!("{}\n\nBased on the above context, answer: {}", context, input)
}
