//! Column data types and record describers.
//!
//! A [`RecordDescriber`] says which columns an index stores and in what
//! order: key columns first, then (on clustered leaf pages) the two system
//! columns `DB_TRX_ID` and `DB_ROLL_PTR`, then the non-key row columns.
//! [`RecordDescriber::columns`] flattens that into positional
//! [`ColumnDescriptor`]s; the position is what ties a column to its entry in
//! the record header's length/null/extern tables.
//!
//! Describers for the InnoDB catalog tables are compile-time constants (see
//! [`dictionary`](crate::innodb::dictionary)); describers for user tables are
//! assembled from `SYS_COLUMNS`/`SYS_FIELDS` rows at runtime.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::innodb::constants::*;
use crate::IdbError;

/// Storage type of a column, as far as record decoding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataType {
    /// TINYINT through BIGINT (plus BOOL and the 6-byte INT6).
    Integer { width: usize, unsigned: bool },
    /// Fixed-length character column.
    Char { length: usize },
    /// CHAR in a multi-byte character set. Compact records store it with a
    /// length byte like a VARCHAR; `max_length` is the declared byte length.
    MultiByteChar { max_length: usize },
    /// Variable-length character column.
    VarChar { max_length: usize },
    /// Fixed-length binary column.
    Binary { length: usize },
    /// Variable-length binary column.
    VarBinary { max_length: usize },
    /// BLOB/TEXT; always variable and possibly stored off-page.
    Blob,
    /// `DB_TRX_ID`, 6 bytes.
    TransactionId,
    /// `DB_ROLL_PTR`, 7 bytes.
    RollPointer,
    /// `DB_ROW_ID`, 6 bytes, used as key when a table has no primary key.
    RowId,
    /// A fixed-width type this reader does not interpret; decoded as hex.
    Opaque { mtype: u64, length: usize },
}

/// Collation ids of the multi-byte MySQL character sets (big5, ujis, sjis,
/// euckr, gb2312, gbk, utf8, ucs2, utf8mb4, utf16, utf16le, utf32, cp932,
/// eucjpms, gb18030).
fn is_multibyte_collation(id: u64) -> bool {
    matches!(
        id,
        1 | 84
            | 12 | 91
            | 13 | 88
            | 19 | 85
            | 24 | 86
            | 28 | 87
            | 33 | 76 | 83 | 192..=215 | 223
            | 35 | 90 | 128..=151 | 159
            | 45 | 46 | 224..=247 | 255..=323
            | 54 | 55 | 101..=124
            | 56 | 62
            | 60 | 61 | 160..=183
            | 95 | 96
            | 97 | 98
            | 248..=250
    )
}

/// Integer widths by base type name.
fn integer_width(base_type: &str) -> Option<usize> {
    match base_type {
        "BOOL" | "BOOLEAN" | "TINYINT" => Some(1),
        "SMALLINT" => Some(2),
        "MEDIUMINT" => Some(3),
        "INT" | "INTEGER" => Some(4),
        "INT6" => Some(6),
        "BIGINT" => Some(8),
        _ => None,
    }
}

impl DataType {
    /// Build a type from its base name, modifier and properties, e.g.
    /// `("VARCHAR", "100", "")` or `("INT", "", "UNSIGNED")`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::schema::DataType;
    ///
    /// let t = DataType::parse("INT", "", "UNSIGNED").unwrap();
    /// assert_eq!(t, DataType::Integer { width: 4, unsigned: true });
    ///
    /// let v = DataType::parse("VARCHAR", "100", "").unwrap();
    /// assert_eq!(v.fixed_width(), None);
    ///
    /// assert!(DataType::parse("GEOMETRY", "", "").is_err());
    /// ```
    pub fn parse(base_type: &str, modifiers: &str, properties: &str) -> Result<Self, IdbError> {
        let base = base_type.trim().to_ascii_uppercase();
        let modifiers = modifiers.trim();
        let unsigned = properties
            .split_whitespace()
            .any(|p| p.eq_ignore_ascii_case("UNSIGNED"));

        let size = || -> Result<usize, IdbError> {
            modifiers.parse::<usize>().map_err(|_| IdbError::UnknownDataType {
                type_name: format!("{}({})", base, modifiers),
            })
        };

        if let Some(width) = integer_width(&base) {
            return Ok(DataType::Integer { width, unsigned });
        }

        match base.as_str() {
            "CHAR" => Ok(DataType::Char { length: size()? }),
            "VARCHAR" => Ok(DataType::VarChar { max_length: size()? }),
            "BINARY" => Ok(DataType::Binary { length: size()? }),
            "VARBINARY" => Ok(DataType::VarBinary { max_length: size()? }),
            "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "TINYTEXT" | "TEXT"
            | "MEDIUMTEXT" | "LONGTEXT" => Ok(DataType::Blob),
            "TRX_ID" => Ok(DataType::TransactionId),
            "ROLL_PTR" => Ok(DataType::RollPointer),
            "ROW_ID" => Ok(DataType::RowId),
            _ => Err(IdbError::UnknownDataType { type_name: base }),
        }
    }

    /// Parse a full definition such as `"VARCHAR(100)"` or `"BIGINT UNSIGNED"`.
    pub fn parse_definition(definition: &str) -> Result<Self, IdbError> {
        let definition = definition.trim();
        let (head, properties) = match definition.find(' ') {
            Some(i) => (&definition[..i], &definition[i + 1..]),
            None => (definition, ""),
        };
        let (base, modifiers) = match (head.find('('), head.rfind(')')) {
            (Some(open), Some(close)) if close > open => (&head[..open], &head[open + 1..close]),
            _ => (head, ""),
        };
        Self::parse(base, modifiers, properties)
    }

    /// Map a `SYS_COLUMNS` (MTYPE, PRTYPE, LEN) triple to a type.
    ///
    /// A `DATA_MYSQL` CHAR whose collation (PRTYPE bits 16..31) belongs to a
    /// multi-byte character set becomes [`DataType::MultiByteChar`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::constants::*;
    /// use ibr::innodb::schema::DataType;
    ///
    /// // CHAR(10) in utf8mb3 (collation 33)
    /// let t = DataType::from_mtype(DATA_MYSQL, (33 << 16) | DATA_NOT_NULL, 30).unwrap();
    /// assert_eq!(t, DataType::MultiByteChar { max_length: 30 });
    /// assert!(t.is_variable());
    ///
    /// // CHAR(10) in latin1 (collation 8)
    /// let t = DataType::from_mtype(DATA_MYSQL, 8 << 16, 10).unwrap();
    /// assert_eq!(t.fixed_width(), Some(10));
    /// ```
    pub fn from_mtype(mtype: u64, prtype: u64, len: u64) -> Result<Self, IdbError> {
        let len = len as usize;
        match mtype {
            DATA_VARCHAR | DATA_VARMYSQL => Ok(DataType::VarChar { max_length: len }),
            DATA_MYSQL if prtype & DATA_BINARY_TYPE != 0 => Ok(DataType::Binary { length: len }),
            DATA_MYSQL if is_multibyte_collation((prtype >> 16) & 0x7FFF) => {
                Ok(DataType::MultiByteChar { max_length: len })
            }
            DATA_CHAR | DATA_MYSQL => Ok(DataType::Char { length: len }),
            DATA_FIXBINARY => Ok(DataType::Binary { length: len }),
            DATA_BINARY => Ok(DataType::VarBinary { max_length: len }),
            DATA_BLOB => Ok(DataType::Blob),
            DATA_INT if matches!(len, 1 | 2 | 3 | 4 | 6 | 8) => Ok(DataType::Integer {
                width: len,
                unsigned: prtype & DATA_UNSIGNED != 0,
            }),
            DATA_SYS => match len {
                DATA_TRX_ID_LEN => Ok(DataType::TransactionId),
                DATA_ROLL_PTR_LEN => Ok(DataType::RollPointer),
                _ => Ok(DataType::RowId),
            },
            _ => Err(IdbError::UnknownDataType {
                type_name: format!("MTYPE {} (LEN {})", mtype, len),
            }),
        }
    }

    /// Stored width in bytes, or `None` when the length comes from the
    /// record header.
    pub fn fixed_width(&self) -> Option<usize> {
        match *self {
            DataType::Integer { width, .. } => Some(width),
            DataType::Char { length } | DataType::Binary { length } => Some(length),
            DataType::Opaque { length, .. } => Some(length),
            DataType::TransactionId => Some(DATA_TRX_ID_LEN),
            DataType::RollPointer => Some(DATA_ROLL_PTR_LEN),
            DataType::RowId => Some(DATA_ROW_ID_LEN),
            DataType::VarChar { .. }
            | DataType::MultiByteChar { .. }
            | DataType::VarBinary { .. }
            | DataType::Blob => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_width().is_none()
    }

    /// True if the compact-format length of this column may take two bytes.
    pub fn allows_long_length(&self) -> bool {
        match *self {
            DataType::Blob => true,
            DataType::VarChar { max_length }
            | DataType::MultiByteChar { max_length }
            | DataType::VarBinary { max_length } => max_length > 255,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DataType::Integer { width, unsigned } => {
                let base = match width {
                    1 => "TINYINT",
                    2 => "SMALLINT",
                    3 => "MEDIUMINT",
                    4 => "INT",
                    6 => "INT6",
                    _ => "BIGINT",
                };
                if unsigned {
                    write!(f, "{} UNSIGNED", base)
                } else {
                    f.write_str(base)
                }
            }
            DataType::Char { length } => write!(f, "CHAR({})", length),
            DataType::VarChar { max_length } => write!(f, "VARCHAR({})", max_length),
            DataType::MultiByteChar { max_length } => write!(f, "MBCHAR({})", max_length),
            DataType::Binary { length } => write!(f, "BINARY({})", length),
            DataType::VarBinary { max_length } => write!(f, "VARBINARY({})", max_length),
            DataType::Blob => f.write_str("BLOB"),
            DataType::TransactionId => f.write_str("TRX_ID"),
            DataType::RollPointer => f.write_str("ROLL_PTR"),
            DataType::RowId => f.write_str("ROW_ID"),
            DataType::Opaque { mtype, length } => write!(f, "OPAQUE(mtype={}, len={})", mtype, length),
        }
    }
}

/// Whether a column belongs to the index key, the row payload, or is one of
/// the hidden system columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Key,
    Row,
    System,
}

/// One column as laid out in a physical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub role: ColumnRole,
    /// Ordinal position in the physical record, starting at 0.
    pub position: usize,
}

impl ColumnDescriptor {
    /// Stored width in bytes, 0 if variable.
    pub fn fixed_width(&self) -> usize {
        self.data_type.fixed_width().unwrap_or(0)
    }
}

/// A column definition inside a describer, before positions are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: Cow<'static, str>,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnDef {
    /// A NOT NULL column with a static name, usable in `const` tables.
    pub const fn not_null(name: &'static str, data_type: DataType) -> Self {
        ColumnDef {
            name: Cow::Borrowed(name),
            data_type,
            nullable: false,
        }
    }

    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        ColumnDef {
            name: Cow::Owned(name.into()),
            data_type,
            nullable,
        }
    }
}

/// Clustered indexes carry full rows and system columns on their leaves;
/// secondary indexes carry the key plus the clustered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Clustered,
    Secondary,
}

/// Column layout of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDescriber {
    pub kind: IndexKind,
    pub keys: Cow<'static, [ColumnDef]>,
    pub rows: Cow<'static, [ColumnDef]>,
}

const SYSTEM_COLUMNS: [ColumnDef; 2] = [
    ColumnDef::not_null("DB_TRX_ID", DataType::TransactionId),
    ColumnDef::not_null("DB_ROLL_PTR", DataType::RollPointer),
];

impl RecordDescriber {
    /// Describer backed by static column tables.
    pub const fn fixed(
        kind: IndexKind,
        keys: &'static [ColumnDef],
        rows: &'static [ColumnDef],
    ) -> Self {
        RecordDescriber {
            kind,
            keys: Cow::Borrowed(keys),
            rows: Cow::Borrowed(rows),
        }
    }

    /// Describer assembled at runtime.
    pub fn new(kind: IndexKind, keys: Vec<ColumnDef>, rows: Vec<ColumnDef>) -> Self {
        RecordDescriber {
            kind,
            keys: Cow::Owned(keys),
            rows: Cow::Owned(rows),
        }
    }

    /// Physical column order for a page at the given level.
    ///
    /// Clustered node pointers hold only the key columns. Secondary node
    /// pointers hold every index field, so the clustered key columns follow
    /// the keys. The child page number after them is not a column.
    pub fn columns(&self, leaf: bool) -> Vec<ColumnDescriptor> {
        let mut out = Vec::with_capacity(self.keys.len() + 2 + self.rows.len());
        let mut push = |def: &ColumnDef, role: ColumnRole| {
            let position = out.len();
            out.push(ColumnDescriptor {
                name: def.name.to_string(),
                data_type: def.data_type,
                nullable: def.nullable,
                role,
                position,
            });
        };

        for def in self.keys.iter() {
            push(def, ColumnRole::Key);
        }
        if self.kind == IndexKind::Clustered {
            if !leaf {
                return out;
            }
            for def in SYSTEM_COLUMNS.iter() {
                push(def, ColumnRole::System);
            }
        }
        for def in self.rows.iter() {
            push(def, ColumnRole::Row);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[ColumnDef] = &[ColumnDef::not_null(
        "ID",
        DataType::Integer {
            width: 4,
            unsigned: false,
        },
    )];
    const ROWS: &[ColumnDef] = &[ColumnDef::not_null(
        "NAME",
        DataType::VarChar { max_length: 100 },
    )];

    #[test]
    fn test_parse_definitions() {
        assert_eq!(
            DataType::parse_definition("VARCHAR(100)").unwrap(),
            DataType::VarChar { max_length: 100 }
        );
        assert_eq!(
            DataType::parse_definition("BIGINT UNSIGNED").unwrap(),
            DataType::Integer {
                width: 8,
                unsigned: true
            }
        );
        assert_eq!(
            DataType::parse_definition("MEDIUMINT").unwrap(),
            DataType::Integer {
                width: 3,
                unsigned: false
            }
        );
        assert_eq!(
            DataType::parse_definition("TRX_ID").unwrap(),
            DataType::TransactionId
        );
        match DataType::parse_definition("POINT") {
            Err(IdbError::UnknownDataType { type_name }) => assert_eq!(type_name, "POINT"),
            other => panic!("expected UnknownDataType, got {:?}", other),
        }
        assert!(DataType::parse_definition("VARCHAR(abc)").is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for def in ["VARCHAR(100)", "INT UNSIGNED", "BIGINT", "CHAR(8)", "ROLL_PTR"] {
            let t = DataType::parse_definition(def).unwrap();
            assert_eq!(t.to_string(), def);
        }
    }

    #[test]
    fn test_from_mtype() {
        assert_eq!(
            DataType::from_mtype(DATA_INT, DATA_NOT_NULL, 4).unwrap(),
            DataType::Integer {
                width: 4,
                unsigned: false
            }
        );
        assert_eq!(
            DataType::from_mtype(DATA_INT, DATA_UNSIGNED, 8).unwrap(),
            DataType::Integer {
                width: 8,
                unsigned: true
            }
        );
        assert_eq!(
            DataType::from_mtype(DATA_VARMYSQL, 0, 300).unwrap(),
            DataType::VarChar { max_length: 300 }
        );
        assert_eq!(
            DataType::from_mtype(DATA_SYS, 0, 7).unwrap(),
            DataType::RollPointer
        );
        assert!(DataType::from_mtype(9, 0, 4).is_err());
    }

    #[test]
    fn test_long_length_rule() {
        assert!(!DataType::VarChar { max_length: 100 }.allows_long_length());
        assert!(DataType::VarChar { max_length: 256 }.allows_long_length());
        assert!(DataType::Blob.allows_long_length());
        assert!(!DataType::Char { length: 255 }.allows_long_length());
    }

    #[test]
    fn test_clustered_leaf_layout() {
        let d = RecordDescriber::fixed(IndexKind::Clustered, KEYS, ROWS);
        let cols = d.columns(true);
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ID", "DB_TRX_ID", "DB_ROLL_PTR", "NAME"]);
        let positions: Vec<_> = cols.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1, 2, 3]);
        assert_eq!(cols[1].role, ColumnRole::System);
        assert_eq!(cols[3].fixed_width(), 0);
    }

    #[test]
    fn test_non_leaf_and_secondary_layouts() {
        let clustered = RecordDescriber::fixed(IndexKind::Clustered, KEYS, ROWS);
        assert_eq!(clustered.columns(false).len(), 1);

        let secondary = RecordDescriber::fixed(IndexKind::Secondary, ROWS, KEYS);
        let cols = secondary.columns(true);
        assert_eq!(cols.len(), 2);
        assert!(cols.iter().all(|c| c.role != ColumnRole::System));
    }

    #[test]
    fn test_secondary_node_pointers_carry_clustered_key() {
        let secondary = RecordDescriber::fixed(IndexKind::Secondary, ROWS, KEYS);
        let cols = secondary.columns(false);
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["NAME", "ID"]);
        assert_eq!(cols[1].role, ColumnRole::Row);
        assert_eq!(cols[1].position, 1);
    }

    #[test]
    fn test_mysql_char_width_follows_charset() {
        let utf8mb4 = DataType::from_mtype(DATA_MYSQL, 255 << 16, 40).unwrap();
        assert_eq!(utf8mb4, DataType::MultiByteChar { max_length: 40 });
        assert!(!utf8mb4.allows_long_length());
        assert!(DataType::MultiByteChar { max_length: 1020 }.allows_long_length());

        let latin1 = DataType::from_mtype(DATA_MYSQL, 8 << 16, 10).unwrap();
        assert_eq!(latin1, DataType::Char { length: 10 });

        let binary = DataType::from_mtype(DATA_MYSQL, (63 << 16) | DATA_BINARY_TYPE, 16).unwrap();
        assert_eq!(binary, DataType::Binary { length: 16 });

        assert_eq!(
            DataType::from_mtype(DATA_CHAR, 33 << 16, 5).unwrap(),
            DataType::Char { length: 5 }
        );
    }
}
