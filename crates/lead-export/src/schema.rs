//! Column discovery and row projection.
//!
//! Projection runs in two passes: [`Schema::discover`] collects every field
//! name across the batch, then [`Schema::project`] builds one fixed-width row
//! per lead. Only the first value of a multi-valued field is kept.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::FixedOffset;
use graph_client::{parse_graph_time, Lead};

/// Column keys whose cells are always formatted as text.
pub const TEXT_COLUMNS: &[&str] = &[
    "phone_number",
    "post_code",
    "zip_code",
    "postal_code",
    "email",
    "street_address",
    "address",
    "id",
];

pub const ID_KEY: &str = "id";
pub const CREATED_TIME_KEY: &str = "created_time";

/// Display format for creation times: `01/02/2024, 03:30 PM`.
pub const DISPLAY_TIME_FORMAT: &str = "%m/%d/%Y, %I:%M %p";

/// A sheet column: internal key plus visible header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub header: String,
}

impl Column {
    fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
        }
    }

    /// Whether cells of this column must be stored as text.
    pub fn is_text(&self) -> bool {
        TEXT_COLUMNS.contains(&self.key.as_str())
    }
}

/// Lowercase the name and collapse whitespace runs into `_`.
pub fn column_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                key.push('_');
            }
            in_space = true;
        } else {
            key.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    key
}

/// Copy of `leads` ordered newest first.
///
/// The sort is stable; leads with unparsable times go last.
pub fn sort_newest_first(leads: &[Lead]) -> Vec<Lead> {
    let mut sorted = leads.to_vec();
    sorted.sort_by_key(|lead| Reverse(lead.created_at()));
    sorted
}

/// Render a Graph timestamp in `tz`, or return it unchanged if unparsable.
pub fn format_created_time(raw: &str, tz: &FixedOffset) -> String {
    match parse_graph_time(raw) {
        Some(instant) => instant.with_timezone(tz).format(DISPLAY_TIME_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Column layout for a batch of leads.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    key_by_name: HashMap<String, String>,
}

impl Schema {
    /// Discover columns: `id`, `created_time`, then all field names sorted.
    ///
    /// Names that normalize to the same key share the first name's column.
    /// A field whose key collides with `id` or `created_time` gets its own
    /// `field_`-prefixed column.
    pub fn discover(leads: &[Lead]) -> Self {
        let names: BTreeSet<&str> = leads
            .iter()
            .flat_map(|lead| lead.field_data.iter().map(|field| field.name.as_str()))
            .collect();

        let mut columns = vec![
            Column::new(ID_KEY, "ID"),
            Column::new(CREATED_TIME_KEY, "Created Time"),
        ];
        let mut seen: HashSet<String> = columns.iter().map(|c| c.key.clone()).collect();
        let mut key_by_name = HashMap::new();

        for name in names {
            let mut key = column_key(name);
            if key == ID_KEY || key == CREATED_TIME_KEY {
                key = format!("field_{}", key);
            }
            if seen.insert(key.clone()) {
                columns.push(Column::new(key.clone(), name));
            }
            key_by_name.insert(name.to_string(), key);
        }

        Self {
            columns,
            key_by_name,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// Build the row for one lead, one cell per column.
    pub fn project(&self, lead: &Lead, tz: &FixedOffset) -> Vec<String> {
        let mut values: HashMap<&str, &str> = HashMap::new();
        for field in &lead.field_data {
            if let Some(key) = self.key_by_name.get(&field.name) {
                let first = field.values.first().map(String::as_str).unwrap_or("");
                values.insert(key.as_str(), first);
            }
        }

        self.columns
            .iter()
            .map(|column| match column.key.as_str() {
                ID_KEY => lead.id.clone(),
                CREATED_TIME_KEY => format_created_time(&lead.created_time, tz),
                key => values.get(key).copied().unwrap_or("").to_string(),
            })
            .collect()
    }
}

/// Leads flattened into a table.
#[derive(Debug, Clone)]
pub struct LeadSheet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl LeadSheet {
    /// Sort `leads` newest first and project them.
    pub fn build(leads: &[Lead], tz: &FixedOffset) -> Self {
        let sorted = sort_newest_first(leads);
        let schema = Schema::discover(&sorted);
        let rows = sorted.iter().map(|lead| schema.project(lead, tz)).collect();
        Self {
            columns: schema.columns,
            rows,
        }
    }

    /// Value of `key` in row `row`.
    pub fn cell(&self, row: usize, key: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c.key == key)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_client::LeadField;

    fn lead(id: &str, created: &str, fields: &[(&str, &[&str])]) -> Lead {
        Lead {
            id: id.to_string(),
            created_time: created.to_string(),
            field_data: fields
                .iter()
                .map(|(name, values)| LeadField {
                    name: name.to_string(),
                    values: values.iter().map(|v| v.to_string()).collect(),
                })
                .collect(),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_column_key() {
        assert_eq!(column_key("Phone Number"), "phone_number");
        assert_eq!(column_key("Street   Address"), "street_address");
        assert_eq!(column_key("E-mail"), "e-mail");
        assert_eq!(column_key("ZIP\tcode"), "zip_code");
    }

    #[test]
    fn test_columns_are_union_sorted_alphabetically() {
        let leads = vec![
            lead("1", "2024-01-01T00:00:00+0000", &[("Name", &["A"]), ("Email", &["a@x"])]),
            lead("2", "2024-01-02T00:00:00+0000", &[("Name", &["B"]), ("Phone", &["1"])]),
        ];

        let schema = Schema::discover(&leads);
        let keys: Vec<_> = schema.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "created_time", "email", "name", "phone"]);
        assert_eq!(
            schema.headers(),
            vec!["ID", "Created Time", "Email", "Name", "Phone"]
        );
    }

    #[test]
    fn test_sort_is_byte_order_not_first_appearance() {
        let leads = vec![lead(
            "1",
            "2024-01-01T00:00:00+0000",
            &[("zip", &["1"]), ("Zip Code", &["2"]), ("age", &["3"])],
        )];
        let schema = Schema::discover(&leads);
        assert_eq!(
            schema.headers(),
            vec!["ID", "Created Time", "Zip Code", "age", "zip"]
        );
    }

    #[test]
    fn test_only_first_value_is_kept() {
        let leads = vec![lead(
            "1",
            "2024-01-01T00:00:00+0000",
            &[("Interests", &["golf", "tennis"]), ("Empty", &[])],
        )];
        let sheet = LeadSheet::build(&leads, &utc());
        assert_eq!(sheet.cell(0, "interests"), Some("golf"));
        assert_eq!(sheet.cell(0, "empty"), Some(""));
    }

    #[test]
    fn test_missing_fields_are_blank() {
        let leads = vec![
            lead("1", "2024-01-01T00:00:00+0000", &[("Email", &["a@x"])]),
            lead("2", "2024-01-02T00:00:00+0000", &[("Phone", &["555"])]),
        ];
        let sheet = LeadSheet::build(&leads, &utc());
        // Row 0 is the newer lead "2".
        assert_eq!(sheet.cell(0, "id"), Some("2"));
        assert_eq!(sheet.cell(0, "email"), Some(""));
        assert_eq!(sheet.cell(1, "phone"), Some(""));
    }

    #[test]
    fn test_newest_first() {
        let leads = vec![
            lead("t1", "2024-01-01T00:00:00+0000", &[]),
            lead("t3", "2024-01-03T00:00:00+0000", &[]),
            lead("t2", "2024-01-02T00:00:00+0000", &[]),
        ];
        let ids: Vec<_> = sort_newest_first(&leads)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_unparsable_times_sort_last_and_stay_stable() {
        let leads = vec![
            lead("bad-a", "garbage", &[]),
            lead("good", "2024-01-01T00:00:00+0000", &[]),
            lead("bad-b", "", &[]),
        ];
        let ids: Vec<_> = sort_newest_first(&leads)
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["good", "bad-a", "bad-b"]);
    }

    #[test]
    fn test_created_time_display_in_regional_zone() {
        let regional = graph_client::regional_timezone();
        assert_eq!(
            format_created_time("2024-01-02T10:00:00+0000", &regional),
            "01/02/2024, 03:30 PM"
        );
        assert_eq!(
            format_created_time("2024-01-02T20:00:00+0000", &regional),
            "01/03/2024, 01:30 AM"
        );
        assert_eq!(format_created_time("not a time", &regional), "not a time");
    }

    #[test]
    fn test_same_key_names_share_a_column() {
        let leads = vec![
            lead("1", "2024-01-01T00:00:00+0000", &[("Full Name", &["A"])]),
            lead("2", "2024-01-02T00:00:00+0000", &[("full  name", &["B"])]),
        ];
        let sheet = LeadSheet::build(&leads, &utc());
        assert_eq!(sheet.columns.len(), 3);
        assert_eq!(sheet.columns[2].header, "Full Name");
        assert_eq!(sheet.cell(0, "full_name"), Some("B"));
        assert_eq!(sheet.cell(1, "full_name"), Some("A"));
    }

    #[test]
    fn test_reserved_key_collision_gets_own_column() {
        let leads = vec![lead("lead-1", "2024-01-01T00:00:00+0000", &[("ID", &["form-id"])])];
        let sheet = LeadSheet::build(&leads, &utc());
        assert_eq!(sheet.cell(0, "id"), Some("lead-1"));
        assert_eq!(sheet.cell(0, "field_id"), Some("form-id"));
    }

    #[test]
    fn test_text_columns() {
        let leads = vec![lead(
            "1",
            "2024-01-01T00:00:00+0000",
            &[("Phone Number", &["0981"]), ("City", &["Pune"])],
        )];
        let schema = Schema::discover(&leads);
        let text: Vec<_> = schema
            .columns()
            .iter()
            .filter(|c| c.is_text())
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(text, vec!["id", "phone_number"]);
    }
}
