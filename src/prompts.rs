use crate::media::MediaType;

pub const ANALYSIS: &str = include_str!("../data/prompts/analysis.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

pub fn analysis_prompt(media_type: MediaType) -> String {
    render(ANALYSIS, &[("media_type", media_type.as_str())])
}
