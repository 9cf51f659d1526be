use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Draft generation defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsConfig {
    /// Used when a draft request carries no `context`.
    #[serde(default = "d_prompt")]
    pub default_prompt: String,
    /// Used when a draft request carries no `system_prompt`.
    #[serde(default = "d_system_prompt")]
    pub default_system_prompt: String,
    #[serde(default = "d_2000")]
    pub default_max_tokens: u32,
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            default_prompt: d_prompt(),
            default_system_prompt: d_system_prompt(),
            default_max_tokens: 2000,
        }
    }
}

fn d_prompt() -> String {
    "Generate a Hinglish newsletter draft.".into()
}

fn d_system_prompt() -> String {
    "You are a newsletter writer creating content in Hinglish \
     (English script with Hindi words mixed naturally). \
     Write for engineers, designers, founders and builders in 500-800 words, \
     structured as hook, context, insight, takeaway and closing."
        .into()
}

fn d_2000() -> u32 {
    2000
}
