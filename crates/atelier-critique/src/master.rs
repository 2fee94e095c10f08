//! Master-artist validation verdict.
//!
//! Custom "learn this master's style" modules are only admitted for
//! recognized artists; the model acts as the referee and returns this
//! document.

use serde::{Deserialize, Serialize};

use crate::client::CritiqueError;
use crate::modules::StyleModule;

/// Accepted-master details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterInfo {
    /// Standard name of the artist.
    pub name: String,
    /// Signature style and technique, in a sentence.
    pub desc: String,
    /// 2-4 character feature tag.
    pub tag: String,
}

/// Whether a proposed master name is a recognized artist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterVerdict {
    pub is_valid: bool,
    pub reason: String,
    pub master_info: Option<MasterInfo>,
}

impl MasterVerdict {
    /// Parse the model's raw JSON payload.
    pub fn parse(raw: &str) -> Result<Self, CritiqueError> {
        let verdict: Self =
            serde_json::from_str(raw).map_err(|e| CritiqueError::Malformed(e.to_string()))?;
        if verdict.is_valid && verdict.master_info.is_none() {
            return Err(CritiqueError::Malformed(
                "valid verdict without master info".into(),
            ));
        }
        Ok(verdict)
    }

    /// Turn an accepted verdict into a selectable style module.
    pub fn into_style_module(self) -> Option<StyleModule> {
        let info = self.master_info?;
        let id = format!(
            "master_{}",
            info.name
                .to_lowercase()
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect::<String>()
        );
        Some(StyleModule {
            id,
            name: info.name,
            reference_type: "master_based".into(),
            core_features: vec![info.desc],
            focus_priority: vec![info.tag],
        })
    }
}
