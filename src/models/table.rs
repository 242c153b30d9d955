use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column-named tabular payload as the vendor returns it: a list of field
/// names plus one array of values per row. Row order is whatever the vendor
/// sent; callers decode into typed rows and sort those.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub fields: Vec<String>,
    pub items: Vec<Vec<Value>>,
    #[serde(default)]
    pub has_more: bool,
}

impl DataTable {
    pub fn new(fields: Vec<String>, items: Vec<Vec<Value>>) -> Self {
        Self {
            fields,
            items,
            has_more: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of a named column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// One row as a field-name → value map. Missing trailing values become null.
    pub fn row_map(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.items.get(index)?;
        let mut map = Map::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            map.insert(field.clone(), row.get(i).cloned().unwrap_or(Value::Null));
        }
        Some(map)
    }

    /// Decode every row into a typed record by zipping field names with values
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<Vec<T>> {
        let mut rows = Vec::with_capacity(self.items.len());
        for index in 0..self.items.len() {
            // row_map only returns None past the end, which the loop excludes
            if let Some(map) = self.row_map(index) {
                rows.push(serde_json::from_value(Value::Object(map))?);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        ts_code: String,
        close: f64,
        pe: Option<f64>,
    }

    fn sample_table() -> DataTable {
        DataTable::new(
            vec!["ts_code".into(), "close".into(), "pe".into()],
            vec![
                vec!["000001.SZ".into(), 10.5.into(), 8.2.into()],
                vec!["600519.SH".into(), 1700.0.into(), Value::Null],
            ],
        )
    }

    #[test]
    fn test_decode_typed_rows() {
        let rows: Vec<Row> = sample_table().decode().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            Row {
                ts_code: "000001.SZ".into(),
                close: 10.5,
                pe: Some(8.2),
            }
        );
        assert_eq!(rows[1].pe, None);
    }

    #[test]
    fn test_short_row_fills_null() {
        let table = DataTable::new(
            vec!["ts_code".into(), "close".into(), "pe".into()],
            vec![vec!["000001.SZ".into(), 10.5.into()]],
        );
        let rows: Vec<Row> = table.decode().unwrap();
        assert_eq!(rows[0].pe, None);
    }

    #[test]
    fn test_column_index_and_len() {
        let table = sample_table();
        assert_eq!(table.column_index("close"), Some(1));
        assert_eq!(table.column_index("missing"), None);
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert!(DataTable::empty().is_empty());
    }

    #[test]
    fn test_json_round_trip_preserves_table() {
        let table = sample_table();
        let encoded = serde_json::to_string(&table).unwrap();
        let decoded: DataTable = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, table);
    }
}
