use crate::core::style::Style;

/// Words a normalized intensity maps to, lowest band first. The middle band
/// is centred on 0.5.
fn intensity_word(normalized: f64) -> &'static str {
    match normalized {
        n if n < 0.3 => "subtle",
        n if n <= 0.6 => "balanced",
        n if n < 0.85 => "strong",
        _ => "intense",
    }
}

/// Render a style as a comma-separated prompt fragment: qualitative words
/// for numeric dials, then categorical descriptors, then tags.
pub fn style_prompt_fragment(style: &Style) -> String {
    let mut parts: Vec<String> = style
        .numeric_params()
        .map(|(key, value, domain)| {
            format!("{} {}", intensity_word(domain.normalize(value)), key.replace('_', " "))
        })
        .collect();

    parts.extend(
        style
            .parameters
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|text| format!("{key}: {text}"))),
    );
    parts.extend(style.tags.iter().cloned());

    parts.join(", ")
}

pub(crate) const SYSTEM_PROMPT: &str = "You are an art director. Expand the brief into a single \
vivid image-generation prompt. Respect every style directive you are given. Reply with the \
prompt only.";

pub(crate) fn brief(concept: &str, style: &Style) -> String {
    let fragment = style_prompt_fragment(style);
    if fragment.is_empty() {
        format!("Concept: {concept}\nStyle: {}", style.name)
    } else {
        format!("Concept: {concept}\nStyle: {} ({fragment})", style.name)
    }
}
