//! Media / style / scenario module catalog.
//!
//! Critiques are parameterized by three modules: the medium being worked
//! in, the style or teacher being measured against, and the usage
//! scenario. Unknown ids fall back to the defaults so stale clients keep
//! working. Validated master artists are admitted as additional style
//! modules at runtime.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default module ids applied when a request omits them.
pub const DEFAULT_MEDIA: &str = "watercolor";
pub const DEFAULT_STYLE: &str = "general";
pub const DEFAULT_SCENARIO: &str = "free_practice";

/// A medium and its teaching focus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaModule {
    pub id: String,
    pub name: String,
    pub core_techniques: Vec<String>,
    pub common_mistakes: Vec<String>,
}

/// A style or teacher reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleModule {
    pub id: String,
    pub name: String,
    pub reference_type: String,
    pub core_features: Vec<String>,
    pub focus_priority: Vec<String>,
}

/// How the critique is framed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioModule {
    pub id: String,
    pub name: String,
    pub evaluation_mode: EvaluationMode,
}

/// Evaluation mode per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    CompareToTargetStyle,
    FreePractice,
    Challenge,
}

/// The three modules resolved for one critique request.
#[derive(Debug, Clone)]
pub struct SelectedModules {
    pub media: MediaModule,
    pub style: StyleModule,
    pub scenario: ScenarioModule,
}

/// Module registry.
pub struct ModuleCatalog {
    media: Arc<RwLock<HashMap<String, MediaModule>>>,
    styles: Arc<RwLock<HashMap<String, StyleModule>>>,
    scenarios: Arc<RwLock<HashMap<String, ScenarioModule>>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        let catalog = Self {
            media: Arc::new(RwLock::new(HashMap::new())),
            styles: Arc::new(RwLock::new(HashMap::new())),
            scenarios: Arc::new(RwLock::new(HashMap::new())),
        };
        catalog.load_defaults();
        catalog
    }

    fn load_defaults(&self) {
        let mut media = self.media.write();
        for m in default_media() {
            media.insert(m.id.clone(), m);
        }
        let mut styles = self.styles.write();
        for s in default_styles() {
            styles.insert(s.id.clone(), s);
        }
        let mut scenarios = self.scenarios.write();
        for s in default_scenarios() {
            scenarios.insert(s.id.clone(), s);
        }
    }

    /// Resolve the request's module ids, falling back to the defaults
    /// for anything unknown.
    pub fn select(
        &self,
        media_id: Option<&str>,
        style_id: Option<&str>,
        scenario_id: Option<&str>,
    ) -> SelectedModules {
        let media = {
            let table = self.media.read();
            media_id
                .and_then(|id| table.get(id))
                .or_else(|| table.get(DEFAULT_MEDIA))
                .cloned()
                .expect("default media module is always present")
        };
        let style = {
            let table = self.styles.read();
            style_id
                .and_then(|id| table.get(id))
                .or_else(|| table.get(DEFAULT_STYLE))
                .cloned()
                .expect("default style module is always present")
        };
        let scenario = {
            let table = self.scenarios.read();
            scenario_id
                .and_then(|id| table.get(id))
                .or_else(|| table.get(DEFAULT_SCENARIO))
                .cloned()
                .expect("default scenario module is always present")
        };
        SelectedModules {
            media,
            style,
            scenario,
        }
    }

    /// Admit a validated master as a style module.
    pub fn add_style(&self, style: StyleModule) {
        self.styles.write().insert(style.id.clone(), style);
    }

    /// All media modules.
    pub fn media_modules(&self) -> Vec<MediaModule> {
        self.media.read().values().cloned().collect()
    }

    /// All style modules.
    pub fn style_modules(&self) -> Vec<StyleModule> {
        self.styles.read().values().cloned().collect()
    }

    /// All scenarios.
    pub fn scenario_modules(&self) -> Vec<ScenarioModule> {
        self.scenarios.read().values().cloned().collect()
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn media(id: &str, name: &str, techniques: [&str; 4], mistakes: [&str; 3]) -> MediaModule {
    MediaModule {
        id: id.into(),
        name: name.into(),
        core_techniques: techniques.iter().map(|s| s.to_string()).collect(),
        common_mistakes: mistakes.iter().map(|s| s.to_string()).collect(),
    }
}

fn default_media() -> Vec<MediaModule> {
    vec![
        media(
            "watercolor",
            "水彩",
            ["濕畫法控制", "邊緣柔化", "色層透明度", "水分比例"],
            ["顏色混濁", "邊緣過硬", "水痕失控"],
        ),
        media(
            "digital_painting",
            "厚塗 (Digital)",
            ["筆觸堆疊", "色塊塑造", "邊緣虛實", "光影統一"],
            ["過度暈染", "結構鬆散", "髒色"],
        ),
        media(
            "digital",
            "數位板繪",
            ["筆觸堆疊", "色塊塑造", "邊緣虛實", "光影統一"],
            ["過度暈染", "結構鬆散", "髒色"],
        ),
        media(
            "sketch",
            "素描/線稿",
            ["線條輕重", "透視準確", "明暗交界", "結構塊面"],
            ["線條毛躁", "比例失準", "灰階不明確"],
        ),
        media(
            "pencil",
            "鉛筆素描",
            ["排線層次", "明暗交界", "虛實變化", "結構準確"],
            ["線條毛躁", "灰階不足", "塗抹過度"],
        ),
        media(
            "colored_pencil",
            "色鉛筆",
            ["疊色層次", "筆觸細膩", "色彩飽和", "留白控制"],
            ["筆觸凌亂", "色彩單薄", "過度用力"],
        ),
        media(
            "marker",
            "麥克筆",
            ["筆觸平塗", "色彩過渡", "疊色混色", "筆法果斷"],
            ["筆觸不均", "色彩滲透", "猶豫修改"],
        ),
        media(
            "acrylic",
            "壓克力",
            ["色塊平塗", "邊緣處理", "層次覆蓋", "色彩鮮明"],
            ["混色不勻", "邊緣粗糙", "乾燥過快"],
        ),
        media(
            "oil",
            "油畫",
            ["厚塗質感", "色彩銜接", "筆觸方向", "光影層次"],
            ["色彩混濁", "層次不清", "油量失控"],
        ),
        media(
            "ink",
            "鋼筆/墨水",
            ["線條流暢", "黑白對比", "排線疏密", "輪廓準確"],
            ["線條抖動", "墨色不均", "結構變形"],
        ),
    ]
}

fn default_styles() -> Vec<StyleModule> {
    vec![
        StyleModule {
            id: "general".into(),
            name: "通用基礎".into(),
            reference_type: "general_standards".into(),
            core_features: vec!["基礎結構".into(), "光影邏輯".into(), "畫面平衡".into()],
            focus_priority: vec!["比例準確".into(), "透視合理".into(), "完成度".into()],
        },
        StyleModule {
            id: "loish_style".into(),
            name: "Loish 風格".into(),
            reference_type: "style_based".into(),
            core_features: vec![
                "柔和色彩過渡".into(),
                "中彩度主色".into(),
                "流暢人物主軸".into(),
            ],
            focus_priority: vec!["色彩層次".into(), "人物動態".into(), "光影柔化".into()],
        },
        StyleModule {
            id: "ghibli_style".into(),
            name: "吉卜力背景風".into(),
            reference_type: "style_based".into(),
            core_features: vec![
                "手繪質感".into(),
                "高明度自然光".into(),
                "豐富環境細節".into(),
            ],
            focus_priority: vec!["雲朵層次".into(), "植被質感".into(), "光影氛圍".into()],
        },
    ]
}

fn default_scenarios() -> Vec<ScenarioModule> {
    vec![
        ScenarioModule {
            id: "free_practice".into(),
            name: "自由練習".into(),
            evaluation_mode: EvaluationMode::FreePractice,
        },
        ScenarioModule {
            id: "style_practice".into(),
            name: "風格練習".into(),
            evaluation_mode: EvaluationMode::CompareToTargetStyle,
        },
        ScenarioModule {
            id: "challenge".into(),
            name: "大師挑戰".into(),
            evaluation_mode: EvaluationMode::Challenge,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_fall_back_to_defaults() {
        let catalog = ModuleCatalog::new();
        let selected = catalog.select(Some("crayon"), Some("nonexistent"), None);
        assert_eq!(selected.media.id, DEFAULT_MEDIA);
        assert_eq!(selected.style.id, DEFAULT_STYLE);
        assert_eq!(selected.scenario.id, DEFAULT_SCENARIO);
    }

    #[test]
    fn known_ids_resolve() {
        let catalog = ModuleCatalog::new();
        let selected = catalog.select(Some("oil"), Some("ghibli_style"), Some("challenge"));
        assert_eq!(selected.media.name, "油畫");
        assert_eq!(selected.style.reference_type, "style_based");
        assert_eq!(selected.scenario.evaluation_mode, EvaluationMode::Challenge);
    }

    #[test]
    fn validated_master_becomes_selectable_style() {
        let catalog = ModuleCatalog::new();
        catalog.add_style(StyleModule {
            id: "master_sargent".into(),
            name: "John Singer Sargent".into(),
            reference_type: "master_based".into(),
            core_features: vec!["果斷筆觸".into()],
            focus_priority: vec!["光影".into()],
        });
        let selected = catalog.select(None, Some("master_sargent"), None);
        assert_eq!(selected.style.id, "master_sargent");
    }
}
