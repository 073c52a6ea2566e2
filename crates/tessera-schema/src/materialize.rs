//! JSON value to [`Document`] conversion.
//!
//! Two modes share one walk of the tree. Partial mode is fed snapshots of
//! an in-flight stream and degrades gracefully: nodes that are not yet
//! usable are omitted, invalid optional fields fall back to defaults, and
//! over-long arrays are cut at their cap. Strict mode validates a finished
//! document and reports the first violation as a [`SchemaError`].
//!
//! The only hard failure shared by both modes is a `version` other than 1,
//! since rendering a document from a future schema revision is never safe.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::{
    AccordionItem, ChartConfig, ChartSeries, ComparisonItem, Component, Document, FeatureEntry,
    GalleryImage, SelectOption, StatItem, TabItem, TimelineItem,
};
use crate::error::{json_type_name, SchemaError};

pub const MAX_ROOT_CHILDREN: usize = 100;
const MAX_FLEX_CHILDREN: usize = 50;
const MAX_LIST_CHILDREN: usize = 50;
const MAX_SECTION_CONTENT: usize = 20;
const MAX_CARD_CHILDREN: usize = 10;
const MAX_GRID_CHILDREN: usize = 20;
const MAX_HERO_CHILDREN: usize = 10;
const MAX_STAT_ITEMS: usize = 8;
const MIN_COMPARISON_ITEMS: usize = 2;
const MAX_COMPARISON_ITEMS: usize = 4;
const MAX_COMPARISON_CHILDREN: usize = 10;
const MAX_GALLERY_IMAGES: usize = 12;
const MAX_TIMELINE_ITEMS: usize = 10;
const MAX_TIMELINE_CHILDREN: usize = 5;
const MAX_FEATURE_ENTRIES: usize = 10;
const UNCAPPED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Partial,
    Strict,
}

/// Build the best snapshot the value supports right now.
///
/// Returns `Ok(None)` while the root is not yet an object. Only a bad
/// `version` fails hard.
pub fn materialize_partial(value: &Value) -> Result<Option<Document>, SchemaError> {
    document(value, Mode::Partial)
}

/// Validate a complete value against the full schema.
pub fn materialize_strict(value: &Value) -> Result<Document, SchemaError> {
    match document(value, Mode::Strict)? {
        Some(doc) => Ok(doc),
        None => Err(SchemaError::RootNotObject),
    }
}

fn document(value: &Value, mode: Mode) -> Result<Option<Document>, SchemaError> {
    let Some(map) = value.as_object() else {
        return match mode {
            Mode::Strict => Err(SchemaError::RootNotObject),
            Mode::Partial => Ok(None),
        };
    };

    match map.get("version") {
        None => {}
        Some(Value::Number(n)) => match n.as_u64() {
            Some(1) => {}
            Some(other) => return Err(SchemaError::UnsupportedVersion(other)),
            None => return Err(SchemaError::InvalidVersion),
        },
        Some(_) => return Err(SchemaError::InvalidVersion),
    }

    if mode == Mode::Strict {
        for key in map.keys() {
            if key != "version" && key != "children" {
                return Err(SchemaError::UnknownField {
                    component: "document",
                    field: key.clone(),
                });
            }
        }
    }

    let children = component_list(
        map.get("children"),
        "document",
        "children",
        MAX_ROOT_CHILDREN,
        mode,
    )?;
    Ok(Some(Document {
        version: 1,
        children,
    }))
}

fn component(value: &Value, mode: Mode) -> Result<Option<Component>, SchemaError> {
    let Some(map) = value.as_object() else {
        return match mode {
            Mode::Strict => Err(SchemaError::NotAnObject {
                found: json_type_name(value),
            }),
            Mode::Partial => Ok(None),
        };
    };

    let type_name = match map.get("type") {
        Some(Value::String(s)) => s.as_str(),
        Some(v) => {
            return match mode {
                Mode::Strict => Err(SchemaError::InvalidField {
                    component: "component",
                    field: "type",
                    reason: format!("expected a string, got {}", json_type_name(v)),
                }),
                Mode::Partial => Ok(None),
            };
        }
        None => {
            return match mode {
                Mode::Strict => Err(SchemaError::MissingField {
                    component: "component",
                    field: "type",
                }),
                Mode::Partial => Ok(None),
            };
        }
    };

    let ctx = |comp: &'static str| Ctx { map, comp, mode };
    match type_name {
        "text" => text(&ctx("text")),
        "flex" => flex(&ctx("flex")),
        "image" => image(&ctx("image")),
        "list" => list(&ctx("list")),
        "button" => button(&ctx("button")),
        "input" => input(&ctx("input")),
        "textarea" => textarea(&ctx("textarea")),
        "select" => select(&ctx("select")),
        "chart" => chart(&ctx("chart")),
        "badge" => badge(&ctx("badge")),
        "progress" => progress(&ctx("progress")),
        "alert" => alert(&ctx("alert")),
        "separator" => separator(&ctx("separator")),
        "accordion" => accordion(&ctx("accordion")),
        "tabs" => tabs(&ctx("tabs")),
        "codeblock" => codeblock(&ctx("codeblock")),
        "card" => card(&ctx("card")),
        "grid" => grid(&ctx("grid")),
        "hero" => hero(&ctx("hero")),
        "stats" => stats(&ctx("stats")),
        "metric" => metric(&ctx("metric")),
        "comparison" => comparison(&ctx("comparison")),
        "gallery" => gallery(&ctx("gallery")),
        "timeline" => timeline(&ctx("timeline")),
        "feature" => feature(&ctx("feature")),
        other => match mode {
            Mode::Strict => Err(SchemaError::UnknownType(other.to_string())),
            Mode::Partial => {
                debug!(component_type = other, "skipping unknown component type");
                Ok(None)
            }
        },
    }
}

fn component_list(
    value: Option<&Value>,
    comp: &'static str,
    field: &'static str,
    cap: usize,
    mode: Mode,
) -> Result<Vec<Component>, SchemaError> {
    let items = match value {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(v) => {
            if mode == Mode::Strict {
                return Err(SchemaError::InvalidField {
                    component: comp,
                    field,
                    reason: format!("expected an array, got {}", json_type_name(v)),
                });
            }
            return Ok(Vec::new());
        }
    };

    if items.len() > cap {
        if mode == Mode::Strict {
            return Err(SchemaError::CapExceeded {
                component: comp,
                field,
                max: cap,
                len: items.len(),
            });
        }
        debug!(component = comp, field, len = items.len(), max = cap, "truncating over-cap array");
    }

    let mut out = Vec::new();
    for item in items.iter().take(cap) {
        if let Some(child) = component(item, mode)? {
            out.push(child);
        }
    }
    Ok(out)
}

struct Ctx<'a> {
    map: &'a Map<String, Value>,
    comp: &'static str,
    mode: Mode,
}

impl Ctx<'_> {
    fn strict(&self) -> bool {
        self.mode == Mode::Strict
    }

    fn missing(&self, field: &'static str) -> SchemaError {
        SchemaError::MissingField {
            component: self.comp,
            field,
        }
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidField {
            component: self.comp,
            field,
            reason: reason.into(),
        }
    }

    fn deny_unknown(&self, allowed: &[&str]) -> Result<(), SchemaError> {
        if !self.strict() {
            return Ok(());
        }
        for key in self.map.keys() {
            if key != "type" && !allowed.contains(&key.as_str()) {
                return Err(SchemaError::UnknownField {
                    component: self.comp,
                    field: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Required string. `Ok(None)` in partial mode means "omit this node".
    fn req_str(&self, field: &'static str) -> Result<Option<String>, SchemaError> {
        match self.map.get(field) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a string, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(None),
            None if self.strict() => Err(self.missing(field)),
            None => Ok(None),
        }
    }

    fn req_str_nonempty(&self, field: &'static str) -> Result<Option<String>, SchemaError> {
        match self.req_str(field)? {
            Some(s) if s.is_empty() => {
                if self.strict() {
                    Err(self.invalid(field, "must not be empty"))
                } else {
                    Ok(None)
                }
            }
            other => Ok(other),
        }
    }

    fn str_or(&self, field: &'static str, default: &str) -> Result<String, SchemaError> {
        match self.map.get(field) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a string, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(default.to_string()),
        }
    }

    /// Nullable string with a non-empty requirement when present.
    fn opt_str(&self, field: &'static str) -> Result<Option<String>, SchemaError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => {
                if self.strict() {
                    Err(self.invalid(field, "must not be empty"))
                } else {
                    Ok(None)
                }
            }
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a string, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(None),
        }
    }

    fn bool_or(&self, field: &'static str, default: bool) -> Result<bool, SchemaError> {
        match self.map.get(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a boolean, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(default),
        }
    }

    fn enum_or<T>(&self, field: &'static str) -> Result<T, SchemaError>
    where
        T: DeserializeOwned + Default,
    {
        match self.map.get(field) {
            None => Ok(T::default()),
            Some(v) => match serde_json::from_value::<T>(v.clone()) {
                Ok(parsed) => Ok(parsed),
                Err(_) if self.strict() => {
                    Err(self.invalid(field, format!("unrecognized value {v}")))
                }
                Err(_) => Ok(T::default()),
            },
        }
    }

    fn enum_req<T: DeserializeOwned>(
        &self,
        field: &'static str,
    ) -> Result<Option<T>, SchemaError> {
        match self.map.get(field) {
            None if self.strict() => Err(self.missing(field)),
            None => Ok(None),
            Some(v) => match serde_json::from_value::<T>(v.clone()) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) if self.strict() => {
                    Err(self.invalid(field, format!("unrecognized value {v}")))
                }
                Err(_) => Ok(None),
            },
        }
    }

    fn enum_nullable<T: DeserializeOwned>(
        &self,
        field: &'static str,
    ) -> Result<Option<T>, SchemaError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => match serde_json::from_value::<T>(v.clone()) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) if self.strict() => {
                    Err(self.invalid(field, format!("unrecognized value {v}")))
                }
                Err(_) => Ok(None),
            },
        }
    }

    fn u32_or(
        &self,
        field: &'static str,
        default: u32,
        min: u32,
        max: u32,
    ) -> Result<u32, SchemaError> {
        match self.map.get(field) {
            None => Ok(default),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) if v >= u64::from(min) && v <= u64::from(max) => Ok(v as u32),
                _ if self.strict() => Err(self.invalid(
                    field,
                    format!("must be an integer between {min} and {max}"),
                )),
                _ => Ok(default),
            },
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a number, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(default),
        }
    }

    fn f64_req_min(&self, field: &'static str, min: f64) -> Result<Option<f64>, SchemaError> {
        match self.map.get(field) {
            None if self.strict() => Err(self.missing(field)),
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v >= min => Ok(Some(v)),
                _ if self.strict() => {
                    Err(self.invalid(field, format!("must be at least {min}")))
                }
                _ => Ok(None),
            },
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a number, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(None),
        }
    }

    fn f64_or_min(
        &self,
        field: &'static str,
        default: f64,
        min: f64,
    ) -> Result<f64, SchemaError> {
        match self.map.get(field) {
            None => Ok(default),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v >= min => Ok(v),
                _ if self.strict() => {
                    Err(self.invalid(field, format!("must be at least {min}")))
                }
                _ => Ok(default),
            },
            Some(v) if self.strict() => Err(self.invalid(
                field,
                format!("expected a number, got {}", json_type_name(v)),
            )),
            Some(_) => Ok(default),
        }
    }

    fn components(&self, field: &'static str, cap: usize) -> Result<Vec<Component>, SchemaError> {
        component_list(self.map.get(field), self.comp, field, cap, self.mode)
    }

    /// Required typed array with a minimum count. `Ok(None)` in partial
    /// mode means the array is not usable yet, so the node is omitted.
    fn req_items<T>(
        &self,
        field: &'static str,
        min: usize,
        cap: usize,
        f: impl Fn(&Value, Mode) -> Result<Option<T>, SchemaError>,
    ) -> Result<Option<Vec<T>>, SchemaError> {
        let items = match self.map.get(field) {
            None if self.strict() => return Err(self.missing(field)),
            None => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(v) if self.strict() => {
                return Err(self.invalid(
                    field,
                    format!("expected an array, got {}", json_type_name(v)),
                ));
            }
            Some(_) => return Ok(None),
        };
        if items.len() > cap && self.strict() {
            return Err(SchemaError::CapExceeded {
                component: self.comp,
                field,
                max: cap,
                len: items.len(),
            });
        }
        let mut out = Vec::new();
        for item in items.iter().take(cap) {
            if let Some(parsed) = f(item, self.mode)? {
                out.push(parsed);
            }
        }
        if out.len() < min {
            if self.strict() {
                return Err(self.invalid(field, format!("requires at least {min} items")));
            }
            return Ok(None);
        }
        Ok(Some(out))
    }

    fn opt_items<T>(
        &self,
        field: &'static str,
        cap: usize,
        f: impl Fn(&Value, Mode) -> Result<Option<T>, SchemaError>,
    ) -> Result<Vec<T>, SchemaError> {
        match self.req_items(field, 0, cap, f)? {
            Some(items) => Ok(items),
            None => Ok(Vec::new()),
        }
    }
}

fn text(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["text", "variant", "align", "style"])?;
    let Some(text) = ctx.req_str("text")? else {
        return Ok(None);
    };
    Ok(Some(Component::Text {
        text,
        variant: ctx.enum_or("variant")?,
        align: ctx.enum_or("align")?,
        style: ctx.enum_or("style")?,
    }))
}

fn flex(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["direction", "align", "justify", "wrap", "children"])?;
    let Some(direction) = ctx.enum_req("direction")? else {
        return Ok(None);
    };
    Ok(Some(Component::Flex {
        direction,
        align: ctx.enum_or("align")?,
        justify: ctx.enum_or("justify")?,
        wrap: ctx.bool_or("wrap", false)?,
        children: ctx.components("children", MAX_FLEX_CHILDREN)?,
    }))
}

fn image(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["src", "searchQuery", "alt", "fit", "radius"])?;
    Ok(Some(Component::Image {
        src: ctx.opt_str("src")?,
        search_query: ctx.opt_str("searchQuery")?,
        alt: ctx.str_or("alt", "")?,
        fit: ctx.enum_or("fit")?,
        radius: ctx.u32_or("radius", 0, 0, 64)?,
    }))
}

fn list(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["ordered", "bulletType", "children"])?;
    Ok(Some(Component::List {
        ordered: ctx.bool_or("ordered", false)?,
        bullet_type: ctx.enum_or("bulletType")?,
        children: ctx.components("children", MAX_LIST_CHILDREN)?,
    }))
}

fn button(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["label", "action", "variant", "size"])?;
    let Some(label) = ctx.req_str_nonempty("label")? else {
        return Ok(None);
    };
    let Some(action) = ctx.req_str_nonempty("action")? else {
        return Ok(None);
    };
    Ok(Some(Component::Button {
        label,
        action,
        variant: ctx.enum_or("variant")?,
        size: ctx.enum_or("size")?,
    }))
}

fn input(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["id", "label", "placeholder", "inputType", "required"])?;
    let Some(id) = ctx.req_str_nonempty("id")? else {
        return Ok(None);
    };
    Ok(Some(Component::Input {
        id,
        label: ctx.str_or("label", "")?,
        placeholder: ctx.str_or("placeholder", "")?,
        input_type: ctx.enum_or("inputType")?,
        required: ctx.bool_or("required", false)?,
    }))
}

fn textarea(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["id", "label", "placeholder", "rows", "required"])?;
    let Some(id) = ctx.req_str_nonempty("id")? else {
        return Ok(None);
    };
    Ok(Some(Component::Textarea {
        id,
        label: ctx.str_or("label", "")?,
        placeholder: ctx.str_or("placeholder", "")?,
        rows: ctx.u32_or("rows", 4, 2, 20)?,
        required: ctx.bool_or("required", false)?,
    }))
}

fn select(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["id", "label", "placeholder", "options", "required"])?;
    let Some(id) = ctx.req_str_nonempty("id")? else {
        return Ok(None);
    };
    let Some(options) = ctx.req_items("options", 1, UNCAPPED, select_option)? else {
        return Ok(None);
    };
    Ok(Some(Component::Select {
        id,
        label: ctx.str_or("label", "")?,
        placeholder: ctx.str_or("placeholder", "Select an option")?,
        options,
        required: ctx.bool_or("required", false)?,
    }))
}

fn select_option(value: &Value, mode: Mode) -> Result<Option<SelectOption>, SchemaError> {
    let Some(ctx) = item_ctx(value, "select.options", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["value", "label"])?;
    let Some(option_value) = ctx.req_str("value")? else {
        return Ok(None);
    };
    let Some(label) = ctx.req_str("label")? else {
        return Ok(None);
    };
    Ok(Some(SelectOption {
        value: option_value,
        label,
    }))
}

fn chart(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["chartType", "title", "description", "data", "config"])?;
    let Some(data) = ctx.req_items("data", 1, UNCAPPED, chart_row)? else {
        return Ok(None);
    };
    let Some(config) = chart_config(ctx)? else {
        return Ok(None);
    };
    Ok(Some(Component::Chart {
        chart_type: ctx.enum_or("chartType")?,
        title: ctx.str_or("title", "")?,
        description: ctx.str_or("description", "")?,
        data,
        config,
    }))
}

/// Chart rows are open records, but every value must be a string or a
/// number so the renderer can plot them.
fn chart_row(value: &Value, mode: Mode) -> Result<Option<Map<String, Value>>, SchemaError> {
    let Some(obj) = value.as_object() else {
        if mode == Mode::Strict {
            return Err(SchemaError::InvalidField {
                component: "chart",
                field: "data",
                reason: format!("row must be an object, got {}", json_type_name(value)),
            });
        }
        return Ok(None);
    };
    let mut row = Map::new();
    for (key, v) in obj {
        match v {
            Value::String(_) | Value::Number(_) => {
                row.insert(key.clone(), v.clone());
            }
            other if mode == Mode::Strict => {
                return Err(SchemaError::InvalidField {
                    component: "chart",
                    field: "data",
                    reason: format!(
                        "row value `{key}` must be a string or number, got {}",
                        json_type_name(other)
                    ),
                });
            }
            _ => {}
        }
    }
    Ok(Some(row))
}

fn chart_config(ctx: &Ctx) -> Result<Option<ChartConfig>, SchemaError> {
    let value = match ctx.map.get("config") {
        Some(v) => v,
        None if ctx.strict() => return Err(ctx.missing("config")),
        None => return Ok(None),
    };
    let Some(map) = value.as_object() else {
        if ctx.strict() {
            return Err(ctx.invalid(
                "config",
                format!("expected an object, got {}", json_type_name(value)),
            ));
        }
        return Ok(None);
    };
    let cfg = Ctx {
        map,
        comp: "chart.config",
        mode: ctx.mode,
    };
    cfg.deny_unknown(&["xKey", "yKeys"])?;
    let Some(x_key) = cfg.req_str("xKey")? else {
        return Ok(None);
    };
    let Some(y_keys) = cfg.req_items("yKeys", 0, UNCAPPED, chart_series)? else {
        return Ok(None);
    };
    Ok(Some(ChartConfig { x_key, y_keys }))
}

fn chart_series(value: &Value, mode: Mode) -> Result<Option<ChartSeries>, SchemaError> {
    let Some(ctx) = item_ctx(value, "chart.config.yKeys", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["key", "label", "color"])?;
    let Some(key) = ctx.req_str("key")? else {
        return Ok(None);
    };
    let Some(label) = ctx.req_str("label")? else {
        return Ok(None);
    };
    let Some(color) = ctx.req_str("color")? else {
        return Ok(None);
    };
    Ok(Some(ChartSeries { key, label, color }))
}

fn badge(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["text", "variant"])?;
    let Some(text) = ctx.req_str_nonempty("text")? else {
        return Ok(None);
    };
    Ok(Some(Component::Badge {
        text,
        variant: ctx.enum_or("variant")?,
    }))
}

fn progress(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["value", "max", "showLabel", "label"])?;
    let Some(value) = ctx.f64_req_min("value", 0.0)? else {
        return Ok(None);
    };
    Ok(Some(Component::Progress {
        value,
        max: ctx.f64_or_min("max", 100.0, 1.0)?,
        show_label: ctx.bool_or("showLabel", true)?,
        label: ctx.str_or("label", "Progress")?,
    }))
}

fn alert(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["title", "description", "variant"])?;
    Ok(Some(Component::Alert {
        title: ctx.str_or("title", "")?,
        description: ctx.str_or("description", "")?,
        variant: ctx.enum_or("variant")?,
    }))
}

fn separator(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["orientation"])?;
    Ok(Some(Component::Separator {
        orientation: ctx.enum_or("orientation")?,
    }))
}

fn accordion(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["items", "allowMultiple"])?;
    let Some(items) = ctx.req_items("items", 1, UNCAPPED, accordion_item)? else {
        return Ok(None);
    };
    Ok(Some(Component::Accordion {
        items,
        allow_multiple: ctx.bool_or("allowMultiple", false)?,
    }))
}

fn accordion_item(value: &Value, mode: Mode) -> Result<Option<AccordionItem>, SchemaError> {
    let Some(ctx) = item_ctx(value, "accordion.items", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["title", "content"])?;
    let Some(title) = ctx.req_str("title")? else {
        return Ok(None);
    };
    Ok(Some(AccordionItem {
        title,
        content: ctx.components("content", MAX_SECTION_CONTENT)?,
    }))
}

fn tabs(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["tabs"])?;
    let Some(tabs) = ctx.req_items("tabs", 1, UNCAPPED, tab_item)? else {
        return Ok(None);
    };
    Ok(Some(Component::Tabs { tabs }))
}

fn tab_item(value: &Value, mode: Mode) -> Result<Option<TabItem>, SchemaError> {
    let Some(ctx) = item_ctx(value, "tabs.tabs", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["label", "content"])?;
    let Some(label) = ctx.req_str("label")? else {
        return Ok(None);
    };
    Ok(Some(TabItem {
        label,
        content: ctx.components("content", MAX_SECTION_CONTENT)?,
    }))
}

fn codeblock(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["code", "language", "showLineNumbers"])?;
    let Some(code) = ctx.req_str_nonempty("code")? else {
        return Ok(None);
    };
    Ok(Some(Component::Codeblock {
        code,
        language: ctx.str_or("language", "plaintext")?,
        show_line_numbers: ctx.bool_or("showLineNumbers", false)?,
    }))
}

fn card(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&[
        "title",
        "description",
        "image",
        "imageQuery",
        "children",
        "clickAction",
    ])?;
    Ok(Some(Component::Card {
        title: ctx.str_or("title", "")?,
        description: ctx.str_or("description", "")?,
        image: ctx.opt_str("image")?,
        image_query: ctx.opt_str("imageQuery")?,
        children: ctx.components("children", MAX_CARD_CHILDREN)?,
        click_action: ctx.opt_str("clickAction")?,
    }))
}

fn grid(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["columns", "children"])?;
    Ok(Some(Component::Grid {
        columns: ctx.u32_or("columns", 2, 1, 3)?,
        children: ctx.components("children", MAX_GRID_CHILDREN)?,
    }))
}

fn hero(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&[
        "title",
        "subtitle",
        "backgroundImage",
        "backgroundImageQuery",
        "overlayColor",
        "children",
    ])?;
    Ok(Some(Component::Hero {
        title: ctx.str_or("title", "")?,
        subtitle: ctx.str_or("subtitle", "")?,
        background_image: ctx.opt_str("backgroundImage")?,
        background_image_query: ctx.opt_str("backgroundImageQuery")?,
        overlay_color: ctx.str_or("overlayColor", "rgba(0,0,0,0.4)")?,
        children: ctx.components("children", MAX_HERO_CHILDREN)?,
    }))
}

fn stats(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["items"])?;
    Ok(Some(Component::Stats {
        items: ctx.opt_items("items", MAX_STAT_ITEMS, stat_item)?,
    }))
}

fn stat_item(value: &Value, mode: Mode) -> Result<Option<StatItem>, SchemaError> {
    let Some(ctx) = item_ctx(value, "stats.items", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["label", "value", "change", "trend", "description", "icon"])?;
    Ok(Some(StatItem {
        label: ctx.str_or("label", "")?,
        value: ctx.str_or("value", "")?,
        change: ctx.str_or("change", "")?,
        trend: ctx.enum_nullable("trend")?,
        description: ctx.str_or("description", "")?,
        icon: ctx.opt_str("icon")?,
    }))
}

fn metric(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&[
        "label",
        "value",
        "change",
        "trend",
        "prefix",
        "suffix",
        "description",
        "variant",
    ])?;
    Ok(Some(Component::Metric {
        label: ctx.str_or("label", "")?,
        value: ctx.str_or("value", "")?,
        change: ctx.str_or("change", "")?,
        trend: ctx.enum_nullable("trend")?,
        prefix: ctx.str_or("prefix", "")?,
        suffix: ctx.str_or("suffix", "")?,
        description: ctx.str_or("description", "")?,
        variant: ctx.enum_or("variant")?,
    }))
}

fn comparison(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["title", "items"])?;
    let Some(items) = ctx.req_items(
        "items",
        MIN_COMPARISON_ITEMS,
        MAX_COMPARISON_ITEMS,
        comparison_item,
    )?
    else {
        return Ok(None);
    };
    Ok(Some(Component::Comparison {
        title: ctx.str_or("title", "")?,
        items,
    }))
}

fn comparison_item(value: &Value, mode: Mode) -> Result<Option<ComparisonItem>, SchemaError> {
    let Some(ctx) = item_ctx(value, "comparison.items", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["label", "subtitle", "children"])?;
    Ok(Some(ComparisonItem {
        label: ctx.str_or("label", "")?,
        subtitle: ctx.str_or("subtitle", "")?,
        children: ctx.components("children", MAX_COMPARISON_CHILDREN)?,
    }))
}

fn gallery(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["title", "images", "columns", "aspectRatio"])?;
    Ok(Some(Component::Gallery {
        title: ctx.str_or("title", "")?,
        images: ctx.opt_items("images", MAX_GALLERY_IMAGES, gallery_image)?,
        columns: ctx.u32_or("columns", 3, 1, 3)?,
        aspect_ratio: ctx.str_or("aspectRatio", "16/9")?,
    }))
}

fn gallery_image(value: &Value, mode: Mode) -> Result<Option<GalleryImage>, SchemaError> {
    let Some(ctx) = item_ctx(value, "gallery.images", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["image", "imageQuery", "title", "subtitle", "clickAction"])?;
    Ok(Some(GalleryImage {
        image: ctx.opt_str("image")?,
        image_query: ctx.opt_str("imageQuery")?,
        title: ctx.str_or("title", "")?,
        subtitle: ctx.str_or("subtitle", "")?,
        click_action: ctx.opt_str("clickAction")?,
    }))
}

fn timeline(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["items", "variant"])?;
    Ok(Some(Component::Timeline {
        items: ctx.opt_items("items", MAX_TIMELINE_ITEMS, timeline_item)?,
        variant: ctx.enum_or("variant")?,
    }))
}

fn timeline_item(value: &Value, mode: Mode) -> Result<Option<TimelineItem>, SchemaError> {
    let Some(ctx) = item_ctx(value, "timeline.items", mode)? else {
        return Ok(None);
    };
    ctx.deny_unknown(&["date", "title", "description", "active", "children"])?;
    Ok(Some(TimelineItem {
        date: ctx.str_or("date", "")?,
        title: ctx.str_or("title", "")?,
        description: ctx.str_or("description", "")?,
        active: ctx.bool_or("active", false)?,
        children: ctx.components("children", MAX_TIMELINE_CHILDREN)?,
    }))
}

fn feature(ctx: &Ctx) -> Result<Option<Component>, SchemaError> {
    ctx.deny_unknown(&["title", "description", "icon", "features", "variant"])?;
    Ok(Some(Component::Feature {
        title: ctx.str_or("title", "")?,
        description: ctx.str_or("description", "")?,
        icon: ctx.opt_str("icon")?,
        features: ctx.opt_items("features", MAX_FEATURE_ENTRIES, feature_entry)?,
        variant: ctx.enum_or("variant")?,
    }))
}

fn feature_entry(value: &Value, mode: Mode) -> Result<Option<FeatureEntry>, SchemaError> {
    match value {
        Value::String(s) => Ok(Some(FeatureEntry::Text(s.clone()))),
        Value::Object(_) => Ok(component(value, mode)?.map(FeatureEntry::Component)),
        other => {
            if mode == Mode::Strict {
                return Err(SchemaError::InvalidField {
                    component: "feature",
                    field: "features",
                    reason: format!(
                        "entry must be a string or component, got {}",
                        json_type_name(other)
                    ),
                });
            }
            Ok(None)
        }
    }
}

fn item_ctx<'a>(
    value: &'a Value,
    comp: &'static str,
    mode: Mode,
) -> Result<Option<Ctx<'a>>, SchemaError> {
    match value.as_object() {
        Some(map) => Ok(Some(Ctx { map, comp, mode })),
        None if mode == Mode::Strict => Err(SchemaError::NotAnObject {
            found: json_type_name(value),
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ButtonVariant, TextVariant};
    use serde_json::json;

    #[test]
    fn strict_accepts_a_complete_document() {
        let value = json!({
            "version": 1,
            "children": [
                {"type": "text", "text": "Hello", "variant": "title"},
                {"type": "button", "label": "Go", "action": "go"}
            ]
        });
        let doc = materialize_strict(&value).unwrap();
        assert_eq!(doc.children.len(), 2);
        assert!(matches!(
            doc.children[0],
            Component::Text { variant: TextVariant::Title, .. }
        ));
    }

    #[test]
    fn strict_rejects_unknown_fields() {
        let value = json!({
            "version": 1,
            "children": [{"type": "badge", "text": "hi", "colour": "red"}]
        });
        let err = materialize_strict(&value).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { component: "badge", .. }));
    }

    #[test]
    fn strict_rejects_unknown_component_type() {
        let value = json!({"children": [{"type": "carousel"}]});
        let err = materialize_strict(&value).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(t) if t == "carousel"));
    }

    #[test]
    fn strict_rejects_over_cap_children() {
        let children: Vec<_> = (0..11).map(|_| json!({"type": "separator"})).collect();
        let value = json!({"children": [{"type": "card", "children": children}]});
        let err = materialize_strict(&value).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::CapExceeded { component: "card", field: "children", max: 10, len: 11 }
        ));
    }

    #[test]
    fn strict_rejects_missing_required_field() {
        let value = json!({"children": [{"type": "button", "label": "Go"}]});
        let err = materialize_strict(&value).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingField { component: "button", field: "action" }
        ));
    }

    #[test]
    fn strict_rejects_comparison_below_minimum() {
        let value = json!({
            "children": [{"type": "comparison", "items": [{"label": "only one"}]}]
        });
        let err = materialize_strict(&value).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidField { component: "comparison", field: "items", .. }
        ));
    }

    #[test]
    fn version_other_than_one_fails_in_both_modes() {
        let value = json!({"version": 2, "children": []});
        assert!(matches!(
            materialize_strict(&value).unwrap_err(),
            SchemaError::UnsupportedVersion(2)
        ));
        assert!(matches!(
            materialize_partial(&value).unwrap_err(),
            SchemaError::UnsupportedVersion(2)
        ));
    }

    #[test]
    fn partial_returns_nothing_for_non_object_root() {
        assert!(materialize_partial(&json!("text")).unwrap().is_none());
        assert!(materialize_partial(&json!([1, 2])).unwrap().is_none());
    }

    #[test]
    fn partial_omits_incomplete_nodes() {
        let value = json!({
            "version": 1,
            "children": [
                {"type": "text", "text": "ready"},
                {"type": "button", "label": "Submi"}
            ]
        });
        let doc = materialize_partial(&value).unwrap().unwrap();
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].type_name(), "text");
    }

    #[test]
    fn partial_defaults_invalid_enum_values() {
        let value = json!({
            "children": [{"type": "button", "label": "Go", "action": "go", "variant": "sparkly"}]
        });
        let doc = materialize_partial(&value).unwrap().unwrap();
        match &doc.children[0] {
            Component::Button { variant, .. } => assert_eq!(*variant, ButtonVariant::Primary),
            other => panic!("expected button, got {}", other.type_name()),
        }
    }

    #[test]
    fn partial_truncates_over_cap_arrays() {
        let children: Vec<_> = (0..15).map(|_| json!({"type": "separator"})).collect();
        let value = json!({"children": [{"type": "card", "children": children}]});
        let doc = materialize_partial(&value).unwrap().unwrap();
        match &doc.children[0] {
            Component::Card { children, .. } => assert_eq!(children.len(), 10),
            other => panic!("expected card, got {}", other.type_name()),
        }
    }

    #[test]
    fn partial_omits_nodes_below_minimum_items() {
        let value = json!({
            "children": [
                {"type": "select", "id": "plan", "options": []},
                {"type": "comparison", "items": [{"label": "a"}]}
            ]
        });
        let doc = materialize_partial(&value).unwrap().unwrap();
        assert!(doc.children.is_empty());
    }

    #[test]
    fn partial_keeps_partial_string_content() {
        let value = json!({
            "children": [{"type": "text", "text": "The answer is still arriv"}]
        });
        let doc = materialize_partial(&value).unwrap().unwrap();
        match &doc.children[0] {
            Component::Text { text, .. } => assert_eq!(text, "The answer is still arriv"),
            other => panic!("expected text, got {}", other.type_name()),
        }
    }

    #[test]
    fn partial_skips_unknown_types_and_keeps_the_rest() {
        let value = json!({
            "children": [
                {"type": "widget3000"},
                {"type": "separator"}
            ]
        });
        let doc = materialize_partial(&value).unwrap().unwrap();
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.children[0].type_name(), "separator");
    }

    #[test]
    fn chart_requires_config_and_data() {
        let incomplete = json!({
            "children": [{"type": "chart", "data": [{"month": "Jan", "value": 3}]}]
        });
        let doc = materialize_partial(&incomplete).unwrap().unwrap();
        assert!(doc.children.is_empty());

        let complete = json!({
            "children": [{
                "type": "chart",
                "data": [{"month": "Jan", "value": 3}],
                "config": {"xKey": "month", "yKeys": [{"key": "value", "label": "Value", "color": "#8884d8"}]}
            }]
        });
        let doc = materialize_strict(&complete).unwrap();
        match &doc.children[0] {
            Component::Chart { config, .. } => assert_eq!(config.x_key, "month"),
            other => panic!("expected chart, got {}", other.type_name()),
        }
    }

    #[test]
    fn numeric_ranges_are_enforced() {
        let value = json!({
            "children": [{"type": "grid", "columns": 7, "children": []}]
        });
        assert!(matches!(
            materialize_strict(&value).unwrap_err(),
            SchemaError::InvalidField { component: "grid", field: "columns", .. }
        ));
        let doc = materialize_partial(&value).unwrap().unwrap();
        match &doc.children[0] {
            Component::Grid { columns, .. } => assert_eq!(*columns, 2),
            other => panic!("expected grid, got {}", other.type_name()),
        }
    }
}
