//! Tolerant decoding of persisted documents and imported checklists.
//!
//! Decoding is two-phase: the text is parsed into a `serde_json::Value`, then
//! walked field by field so that a failure can name the offending field and
//! where it sits (`items → 0 → title`). Absent or `null` optional fields take
//! their defaults; present fields of the wrong type are errors.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::checklist::Checklist;
use crate::item::Item;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z, the reference
/// date of numeric timestamps written by older documents.
const REFERENCE_DATE_OFFSET: i64 = 978_307_200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    Syntax,
    MissingField,
    TypeMismatch { expected: &'static str },
    InvalidValue,
}

impl DecodeErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            DecodeErrorKind::Syntax => "syntax",
            DecodeErrorKind::MissingField => "missing_field",
            DecodeErrorKind::TypeMismatch { .. } => "type_mismatch",
            DecodeErrorKind::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::Syntax => write!(f, "Invalid JSON format"),
            DecodeErrorKind::MissingField => write!(f, "Missing required field"),
            DecodeErrorKind::TypeMismatch { expected } => {
                write!(f, "Type mismatch (expected {expected})")
            }
            DecodeErrorKind::InvalidValue => write!(f, "Invalid value"),
        }
    }
}

/// A decode failure with the field it concerns and the path leading to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {field}\nPath: {}", join_path(&.path))]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// The field name, or the parser message for syntax errors.
    pub field: String,
    pub path: Vec<String>,
}

impl DecodeError {
    fn new(kind: DecodeErrorKind, field: impl Into<String>, path: &[String]) -> Self {
        Self {
            kind,
            field: field.into(),
            path: path.to_vec(),
        }
    }

    /// Path segments joined with arrows, `(root)` when empty.
    pub fn path_display(&self) -> String {
        join_path(&self.path)
    }
}

fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.join(" → ")
    }
}

type Decoded<T> = std::result::Result<T, DecodeError>;

fn child_path(path: &[String], segment: impl ToString) -> Vec<String> {
    let mut next = path.to_vec();
    next.push(segment.to_string());
    next
}

fn parse(text: &str) -> Decoded<Value> {
    serde_json::from_str(text).map_err(|err| DecodeError {
        kind: DecodeErrorKind::Syntax,
        field: err.to_string(),
        path: Vec::new(),
    })
}

/// Decode a whole document: `{"checklists": [...]}` or a bare array.
pub fn decode_document(text: &str) -> Decoded<Vec<Checklist>> {
    let value = parse(text)?;
    let root: Vec<String> = Vec::new();
    match &value {
        Value::Array(_) => decode_checklists(&value, &root),
        Value::Object(map) => match map.get("checklists") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(list) => decode_checklists(list, &child_path(&root, "checklists")),
        },
        _ => Err(DecodeError::new(
            DecodeErrorKind::TypeMismatch {
                expected: "object or array",
            },
            "checklists",
            &root,
        )),
    }
}

/// Decode one standalone checklist, as produced by export.
pub fn decode_checklist(text: &str) -> Decoded<Checklist> {
    let value = parse(text)?;
    checklist_from_value(&value, &[])
}

fn decode_checklists(value: &Value, path: &[String]) -> Decoded<Vec<Checklist>> {
    let Value::Array(entries) = value else {
        return Err(mismatch("checklists", "array", path));
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| checklist_from_value(entry, &child_path(path, index)))
        .collect()
}

fn mismatch(field: &str, expected: &'static str, path: &[String]) -> DecodeError {
    DecodeError::new(DecodeErrorKind::TypeMismatch { expected }, field, path)
}

/// Field access over one JSON object, tracking where it sits.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: &'a [String],
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value, field: &str, path: &'a [String]) -> Decoded<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            _ => Err(mismatch(field, "object", path)),
        }
    }

    /// Present and non-null.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn at(&self, key: &str) -> Vec<String> {
        child_path(self.path, key)
    }

    fn required_string(&self, key: &str) -> Decoded<String> {
        match self.get(key) {
            None => Err(DecodeError::new(
                DecodeErrorKind::MissingField,
                key,
                self.path,
            )),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(mismatch(key, "string", &self.at(key))),
        }
    }

    fn string(&self, key: &str) -> Decoded<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(mismatch(key, "string", &self.at(key))),
        }
    }

    fn bool(&self, key: &str) -> Decoded<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(mismatch(key, "bool", &self.at(key))),
        }
    }

    fn integer(&self, key: &str) -> Decoded<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| mismatch(key, "integer", &self.at(key))),
        }
    }

    fn uuid(&self, key: &str) -> Decoded<Option<Uuid>> {
        let Some(text) = self.string(key)? else {
            return Ok(None);
        };
        Uuid::parse_str(&text)
            .map(Some)
            .map_err(|_| DecodeError::new(DecodeErrorKind::InvalidValue, key, &self.at(key)))
    }

    /// RFC 3339 text, or seconds since 2001-01-01 for older documents.
    fn date(&self, key: &str) -> Decoded<Option<DateTime<Utc>>> {
        let invalid = || DecodeError::new(DecodeErrorKind::InvalidValue, key, &self.at(key));
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
                .map(|date| Some(date.with_timezone(&Utc)))
                .map_err(|_| invalid()),
            Some(Value::Number(number)) => {
                let seconds = number.as_f64().ok_or_else(invalid)?;
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9) as u32;
                Utc.timestamp_opt(whole as i64 + REFERENCE_DATE_OFFSET, nanos)
                    .single()
                    .map(Some)
                    .ok_or_else(invalid)
            }
            Some(_) => Err(mismatch(key, "date", &self.at(key))),
        }
    }

    fn array(&self, key: &str) -> Decoded<Option<&'a Vec<Value>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Array(values)) => Ok(Some(values)),
            Some(_) => Err(mismatch(key, "array", &self.at(key))),
        }
    }
}

fn checklist_from_value(value: &Value, path: &[String]) -> Decoded<Checklist> {
    let fields = Fields::of(value, "checklist", path)?;
    let mut checklist = Checklist::new(fields.required_string("title")?);

    if let Some(id) = fields.uuid("id")? {
        checklist.id = id;
    }
    if let Some(entries) = fields.array("items")? {
        checklist.items = items_from_values(entries, &fields.at("items"))?;
        // Stored levels and parent links are derived; rebuild them from the tree.
        for item in &mut checklist.items {
            item.renumber(None, 0);
        }
    }
    if let Some(entries) = fields.array("tags")? {
        let tags_path = fields.at("tags");
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                Value::String(tag) => {
                    checklist.add_tag(tag);
                }
                _ => return Err(mismatch("tags", "string", &child_path(&tags_path, index))),
            }
        }
    }
    checklist.last_completed_date = fields.date("lastCompletedDate")?;
    checklist.auto_reset_enabled = fields.bool("autoResetEnabled")?.unwrap_or(false);
    checklist.reset_after_days = fields
        .integer("resetAfterDays")?
        .filter(|days| *days > 0)
        .and_then(|days| u32::try_from(days).ok());
    if let Some(created) = fields.date("createdDate")? {
        checklist.created_date = created;
    }
    if let Some(modified) = fields.date("modifiedDate")? {
        checklist.modified_date = modified;
    }
    checklist.notes = fields.string("notes")?.unwrap_or_default();
    Ok(checklist)
}

fn items_from_values(values: &[Value], path: &[String]) -> Decoded<Vec<Item>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| item_from_value(value, &child_path(path, index)))
        .collect()
}

fn item_from_value(value: &Value, path: &[String]) -> Decoded<Item> {
    let fields = Fields::of(value, "item", path)?;
    let mut item = Item::new(fields.required_string("title")?);

    if let Some(id) = fields.uuid("id")? {
        item.id = id;
    }
    if let Some(entries) = fields.array("children")? {
        item.children = items_from_values(entries, &fields.at("children"))?;
    }
    item.is_first_ticked = fields.bool("isFirstTicked")?.unwrap_or(false);
    item.is_second_ticked = fields.bool("isSecondTicked")?;
    item.parent_id = fields.uuid("parentID")?;
    item.nesting_level = fields
        .integer("nestingLevel")?
        .and_then(|level| u32::try_from(level).ok())
        .unwrap_or(0);
    item.is_expanded = fields.bool("isExpanded")?.unwrap_or(true);

    if item.is_leaf() {
        item.is_second_ticked = None;
    } else {
        item.is_second_ticked.get_or_insert(false);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_checklist_takes_defaults() {
        let checklist = decode_checklist(r#"{"title": "Bare"}"#).expect("decode");
        assert_eq!(checklist.title, "Bare");
        assert!(checklist.items.is_empty());
        assert!(checklist.tags.is_empty());
        assert!(!checklist.auto_reset_enabled);
        assert_eq!(checklist.reset_after_days, None);
        assert!(checklist.notes.is_empty());
        assert!(checklist.last_completed_date.is_none());
    }

    #[test]
    fn item_defaults_and_branch_shape() {
        let checklist = decode_checklist(
            r#"{
                "title": "Trip",
                "items": [
                    {"title": "Bag", "children": [{"title": "Socks", "isSecondTicked": true}]},
                    {"title": "Keys", "isFirstTicked": true, "isExpanded": null}
                ]
            }"#,
        )
        .expect("decode");

        let bag = &checklist.items[0];
        assert_eq!(bag.is_second_ticked, Some(false));
        assert!(bag.is_expanded);
        assert_eq!(bag.children[0].is_second_ticked, None);
        assert!(checklist.items[1].is_first_ticked);
        assert!(checklist.items[1].is_expanded);
    }

    #[test]
    fn missing_title_reports_path() {
        let err = decode_checklist(
            r#"{"title": "Trip", "items": [{"title": "ok"}, {"children": []}]}"#,
        )
        .expect_err("missing title");
        assert_eq!(err.kind, DecodeErrorKind::MissingField);
        assert_eq!(err.field, "title");
        assert_eq!(err.path_display(), "items → 1");
        assert_eq!(err.to_string(), "Missing required field: title\nPath: items → 1");
    }

    #[test]
    fn nested_type_mismatch_reports_path() {
        let err = decode_checklist(
            r#"{"title": "Trip", "items": [{"title": "Bag", "children": [{"title": 4}]}]}"#,
        )
        .expect_err("mismatch");
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch { expected: "string" });
        assert_eq!(err.path_display(), "items → 0 → children → 0 → title");
    }

    #[test]
    fn syntax_error_is_labelled() {
        let err = decode_checklist("{not json").expect_err("syntax");
        assert_eq!(err.kind.label(), "syntax");
        assert_eq!(err.path_display(), "(root)");
    }

    #[test]
    fn invalid_uuid_is_rejected() {
        let err = decode_checklist(r#"{"id": "nope", "title": "x"}"#).expect_err("uuid");
        assert_eq!(err.kind, DecodeErrorKind::InvalidValue);
        assert_eq!(err.field, "id");
    }

    #[test]
    fn non_positive_reset_days_are_dropped() {
        let checklist =
            decode_checklist(r#"{"title": "x", "autoResetEnabled": true, "resetAfterDays": 0}"#)
                .expect("decode");
        assert!(checklist.auto_reset_enabled);
        assert_eq!(checklist.reset_after_days, None);
    }

    #[test]
    fn numeric_dates_use_reference_epoch() {
        let checklist =
            decode_checklist(r#"{"title": "x", "createdDate": 0, "lastCompletedDate": 86400.5}"#)
                .expect("decode");
        assert_eq!(checklist.created_date.to_rfc3339(), "2001-01-01T00:00:00+00:00");
        let last = checklist.last_completed_date.expect("date");
        assert_eq!(last.timestamp(), REFERENCE_DATE_OFFSET + 86_400);
    }

    #[test]
    fn document_accepts_object_or_array() {
        let wrapped = decode_document(r#"{"checklists": [{"title": "a"}]}"#).expect("object");
        let bare = decode_document(r#"[{"title": "a"}, {"title": "b"}]"#).expect("array");
        let empty = decode_document("{}").expect("empty");
        assert_eq!(wrapped.len(), 1);
        assert_eq!(bare.len(), 2);
        assert!(empty.is_empty());
        assert!(decode_document("42").is_err());
    }

    #[test]
    fn serialized_checklist_decodes_back() {
        let mut checklist = Checklist::new("Round");
        checklist.add_tag("Home");
        checklist.set_auto_reset(Some(3)).expect("days");
        checklist.notes = "n".to_string();
        checklist.items = vec![
            Item::new("a"),
            Item::with_children("b", vec![Item::new("c")]),
        ];
        checklist.items[1].is_second_ticked = Some(true);
        checklist.mark_completed();

        let text = serde_json::to_string(&checklist).expect("encode");
        let decoded = decode_checklist(&text).expect("decode");
        assert_eq!(decoded, checklist);
    }

    #[test]
    fn tags_are_trimmed_and_blank_tags_skipped() {
        let checklist =
            decode_checklist(r#"{"title": "x", "tags": [" Work ", "", "  ", "Work"]}"#)
                .expect("decode");
        assert_eq!(checklist.tags.iter().collect::<Vec<_>>(), vec!["Work"]);
    }

    #[test]
    fn stored_nesting_levels_are_rebuilt() {
        let checklist = decode_checklist(
            r#"{"title": "x", "items": [
                {"title": "a", "nestingLevel": 7, "children": [{"title": "b", "nestingLevel": 0}]}
            ]}"#,
        )
        .expect("decode");
        let root = &checklist.items[0];
        assert_eq!(root.nesting_level, 0);
        assert_eq!(root.children[0].nesting_level, 1);
        assert_eq!(root.children[0].parent_id, Some(root.id));
    }
}
