use serde::{Deserialize, Serialize};

use crate::error::{WorkshopError, WorkshopResult};
use crate::gateway::wire::GenerateContentResponse;

pub const SUGGESTED_NAME_COUNT: usize = 3;

pub const ANALYSIS_PROMPT: &str = r#"You are a mystical witch in a fantasy world.
Analyze this image of a real-world object.
1. Identify the object.
2. Determine what kind of magical animal familiar this object should transform into based on its shape, color, or vibe.
3. Generate 3 mystical, whimsical names for this familiar.
4. Provide a short, magical description of the familiar.

Return JSON with these exact fields:
{
    "originalItem": "name of the object",
    "species": "type of magical animal",
    "suggestedNames": ["Name1", "Name2", "Name3"],
    "description": "magical description"
}"#;

/// What the model made of a photographed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub original_item: String,
    pub species: String,
    pub suggested_names: Vec<String>,
    pub description: String,
}

impl Analysis {
    /// Answer used whenever the model is unconfigured or unusable.
    pub fn fallback() -> Self {
        Analysis {
            original_item: "Mystery Object".to_owned(),
            species: "Shadow Creature".to_owned(),
            suggested_names: vec!["Umbra".to_owned(), "Shade".to_owned(), "Echo".to_owned()],
            description: "A mysterious creature formed from the void.".to_owned(),
        }
    }

    /// Extracts the analysis JSON the model returned as text.
    ///
    /// Extra suggested names are dropped; fewer than three is malformed.
    pub fn from_response(resp: &GenerateContentResponse) -> WorkshopResult<Self> {
        let text = resp
            .first_text()
            .ok_or_else(|| WorkshopError::malformed("response has no text part"))?;
        let mut analysis: Analysis = serde_json::from_str(text.trim())?;
        if analysis.suggested_names.len() < SUGGESTED_NAME_COUNT {
            return Err(WorkshopError::malformed(format!(
                "expected {} suggested names, got {}",
                SUGGESTED_NAME_COUNT,
                analysis.suggested_names.len()
            )));
        }
        analysis.suggested_names.truncate(SUGGESTED_NAME_COUNT);
        Ok(analysis)
    }
}
