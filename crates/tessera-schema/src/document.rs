use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root of the structured-output tree: `{ "version": 1, "children": [...] }`.
///
/// Snapshots of this type are immutable values; each one supersedes the
/// previous snapshot entirely, so consumers never diff two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub children: Vec<Component>,
}

impl Document {
    pub fn empty() -> Self {
        Self {
            version: 1,
            children: Vec::new(),
        }
    }
}

fn default_version() -> u64 {
    1
}

/// Closed discriminated union of renderable UI components.
///
/// The `type` field is the discriminant. Container variants hold
/// `Vec<Component>` children, making the tree recursive with no depth
/// limit in the type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Text {
        text: String,
        #[serde(default)]
        variant: TextVariant,
        #[serde(default)]
        align: TextAlign,
        #[serde(default)]
        style: TextStyle,
    },

    Flex {
        direction: FlexDirection,
        #[serde(default)]
        align: FlexAlign,
        #[serde(default)]
        justify: FlexJustify,
        #[serde(default)]
        wrap: bool,
        #[serde(default)]
        children: Vec<Component>,
    },

    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default)]
        src: Option<String>,
        #[serde(default)]
        search_query: Option<String>,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        fit: ImageFit,
        #[serde(default)]
        radius: u32,
    },

    #[serde(rename_all = "camelCase")]
    List {
        #[serde(default)]
        ordered: bool,
        #[serde(default)]
        bullet_type: BulletType,
        #[serde(default)]
        children: Vec<Component>,
    },

    Button {
        label: String,
        action: String,
        #[serde(default)]
        variant: ButtonVariant,
        #[serde(default)]
        size: ControlSize,
    },

    #[serde(rename_all = "camelCase")]
    Input {
        id: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        input_type: InputType,
        #[serde(default)]
        required: bool,
    },

    Textarea {
        id: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default = "default_textarea_rows")]
        rows: u32,
        #[serde(default)]
        required: bool,
    },

    Select {
        id: String,
        #[serde(default)]
        label: String,
        #[serde(default = "default_select_placeholder")]
        placeholder: String,
        options: Vec<SelectOption>,
        #[serde(default)]
        required: bool,
    },

    #[serde(rename_all = "camelCase")]
    Chart {
        #[serde(default)]
        chart_type: ChartType,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        data: Vec<Map<String, Value>>,
        config: ChartConfig,
    },

    Badge {
        text: String,
        #[serde(default)]
        variant: StatusVariant,
    },

    #[serde(rename_all = "camelCase")]
    Progress {
        value: f64,
        #[serde(default = "default_progress_max")]
        max: f64,
        #[serde(default = "default_true")]
        show_label: bool,
        #[serde(default = "default_progress_label")]
        label: String,
    },

    Alert {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        variant: StatusVariant,
    },

    Separator {
        #[serde(default)]
        orientation: Orientation,
    },

    #[serde(rename_all = "camelCase")]
    Accordion {
        items: Vec<AccordionItem>,
        #[serde(default)]
        allow_multiple: bool,
    },

    Tabs {
        tabs: Vec<TabItem>,
    },

    #[serde(rename_all = "camelCase")]
    Codeblock {
        code: String,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default)]
        show_line_numbers: bool,
    },

    #[serde(rename_all = "camelCase")]
    Card {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        image_query: Option<String>,
        #[serde(default)]
        children: Vec<Component>,
        #[serde(default)]
        click_action: Option<String>,
    },

    Grid {
        #[serde(default = "default_grid_columns")]
        columns: u32,
        #[serde(default)]
        children: Vec<Component>,
    },

    #[serde(rename_all = "camelCase")]
    Hero {
        #[serde(default)]
        title: String,
        #[serde(default)]
        subtitle: String,
        #[serde(default)]
        background_image: Option<String>,
        #[serde(default)]
        background_image_query: Option<String>,
        #[serde(default = "default_overlay_color")]
        overlay_color: String,
        #[serde(default)]
        children: Vec<Component>,
    },

    Stats {
        #[serde(default)]
        items: Vec<StatItem>,
    },

    Metric {
        #[serde(default)]
        label: String,
        #[serde(default)]
        value: String,
        #[serde(default)]
        change: String,
        #[serde(default)]
        trend: Option<MetricTrend>,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        variant: MetricVariant,
    },

    Comparison {
        #[serde(default)]
        title: String,
        items: Vec<ComparisonItem>,
    },

    #[serde(rename_all = "camelCase")]
    Gallery {
        #[serde(default)]
        title: String,
        #[serde(default)]
        images: Vec<GalleryImage>,
        #[serde(default = "default_gallery_columns")]
        columns: u32,
        #[serde(default = "default_aspect_ratio")]
        aspect_ratio: String,
    },

    Timeline {
        #[serde(default)]
        items: Vec<TimelineItem>,
        #[serde(default)]
        variant: TimelineVariant,
    },

    Feature {
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        features: Vec<FeatureEntry>,
        #[serde(default)]
        variant: FeatureVariant,
    },
}

impl Component {
    /// Wire name of this variant's `type` discriminant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Component::Text { .. } => "text",
            Component::Flex { .. } => "flex",
            Component::Image { .. } => "image",
            Component::List { .. } => "list",
            Component::Button { .. } => "button",
            Component::Input { .. } => "input",
            Component::Textarea { .. } => "textarea",
            Component::Select { .. } => "select",
            Component::Chart { .. } => "chart",
            Component::Badge { .. } => "badge",
            Component::Progress { .. } => "progress",
            Component::Alert { .. } => "alert",
            Component::Separator { .. } => "separator",
            Component::Accordion { .. } => "accordion",
            Component::Tabs { .. } => "tabs",
            Component::Codeblock { .. } => "codeblock",
            Component::Card { .. } => "card",
            Component::Grid { .. } => "grid",
            Component::Hero { .. } => "hero",
            Component::Stats { .. } => "stats",
            Component::Metric { .. } => "metric",
            Component::Comparison { .. } => "comparison",
            Component::Gallery { .. } => "gallery",
            Component::Timeline { .. } => "timeline",
            Component::Feature { .. } => "feature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextVariant {
    Title,
    Subtitle,
    #[default]
    Body,
    Caption,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strike: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub color: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            code: false,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexAlign {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexJustify {
    #[default]
    Start,
    Center,
    End,
    Between,
    Around,
    Evenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
    None,
    ScaleDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletType {
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Outline,
    Ghost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSize {
    Sm,
    #[default]
    Md,
    Lg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Area,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub x_key: String,
    pub y_keys: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub key: String,
    pub label: String,
    pub color: String,
}

/// Shared by badge and alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusVariant {
    #[default]
    Default,
    Success,
    Warning,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccordionItem {
    pub title: String,
    #[serde(default)]
    pub content: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabItem {
    pub label: String,
    #[serde(default)]
    pub content: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub change: String,
    #[serde(default)]
    pub trend: Option<StatTrend>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatTrend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricTrend {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricVariant {
    #[default]
    Default,
    Primary,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub children: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_query: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub click_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub children: Vec<Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineVariant {
    #[default]
    Vertical,
    Horizontal,
}

/// A feature bullet is either a plain string or a full component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureEntry {
    Text(String),
    Component(Component),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureVariant {
    #[default]
    Default,
    Primary,
    Dark,
}

fn default_textarea_rows() -> u32 {
    4
}

fn default_select_placeholder() -> String {
    "Select an option".to_string()
}

fn default_progress_max() -> f64 {
    100.0
}

fn default_progress_label() -> String {
    "Progress".to_string()
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "plaintext".to_string()
}

fn default_grid_columns() -> u32 {
    2
}

fn default_gallery_columns() -> u32 {
    3
}

fn default_overlay_color() -> String {
    "rgba(0,0,0,0.4)".to_string()
}

fn default_aspect_ratio() -> String {
    "16/9".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_roundtrip() {
        let json = r#"{
            "version": 1,
            "children": [
                {"type": "text", "text": "hello", "variant": "body", "align": "start",
                 "style": {"bold": false, "italic": false, "underline": false,
                           "strike": false, "code": false, "color": null}},
                {"type": "badge", "text": "new", "variant": "info"}
            ]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].type_name(), "text");
        assert_eq!(doc.children[1].type_name(), "badge");
    }

    #[test]
    fn test_defaults_applied_on_missing_fields() {
        let json = r#"{"type": "grid", "children": []}"#;
        let component: Component = serde_json::from_str(json).unwrap();

        match component {
            Component::Grid { columns, children } => {
                assert_eq!(columns, 2);
                assert!(children.is_empty());
            }
            other => panic!("expected grid, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_nested_recursion() {
        let json = r#"{
            "type": "flex",
            "direction": "row",
            "children": [
                {"type": "card", "children": [
                    {"type": "separator"}
                ]}
            ]
        }"#;

        let component: Component = serde_json::from_str(json).unwrap();
        match component {
            Component::Flex { children, .. } => match &children[0] {
                Component::Card { children, .. } => {
                    assert_eq!(children[0].type_name(), "separator");
                }
                other => panic!("expected card, got {}", other.type_name()),
            },
            other => panic!("expected flex, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_feature_entry_untagged() {
        let json = r#"{
            "type": "feature",
            "features": ["fast", {"type": "badge", "text": "beta"}]
        }"#;

        let component: Component = serde_json::from_str(json).unwrap();
        match component {
            Component::Feature { features, .. } => {
                assert_eq!(features.len(), 2);
                assert!(matches!(features[0], FeatureEntry::Text(_)));
                assert!(matches!(features[1], FeatureEntry::Component(_)));
            }
            other => panic!("expected feature, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_camel_case_wire_names() {
        let component = Component::Image {
            src: None,
            search_query: Some("sunset".to_string()),
            alt: String::new(),
            fit: ImageFit::Cover,
            radius: 8,
        };

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["searchQuery"], "sunset");
        assert!(value.get("search_query").is_none());
    }
}
