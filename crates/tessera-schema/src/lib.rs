pub mod document;
pub mod error;
pub mod materialize;
pub mod partial;

pub use document::{
    AccordionItem, BulletType, ButtonVariant, ChartConfig, ChartSeries, ChartType,
    ComparisonItem, Component, ControlSize, Document, FeatureEntry, FeatureVariant,
    FlexAlign, FlexDirection, FlexJustify, GalleryImage, ImageFit, InputType, MetricTrend,
    MetricVariant, Orientation, SelectOption, StatItem, StatTrend, StatusVariant, TabItem,
    TextAlign, TextStyle, TextVariant, TimelineItem, TimelineVariant,
};
pub use error::SchemaError;
pub use materialize::{materialize_partial, materialize_strict, MAX_ROOT_CHILDREN};
pub use partial::parse_partial_json;
