use parrot_config::PersonaConfig;

/// Single-turn prompt: persona guidance, few-shot exchanges, then the input.
pub fn build_prompt(persona: &PersonaConfig, input: &str) -> String {
    let examples = persona
        .examples
        .iter()
        .map(|example| format!("human: {}\nyou: {}", example.user, example.reply))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "instruction:\n{}\n\nexample conversations:\n{examples}\n\nrespond to this:\n{input}",
        persona.guidance.trim()
    )
}
