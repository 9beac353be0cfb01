use crate::error::{MultiindexError, Result};
use tantivy::schema::{Field, Schema as TantivySchema, STORED, STRING, TEXT};

/// The three fields every tenant index carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageField {
    Url,
    Title,
    Body,
}

impl PageField {
    pub const ALL: [PageField; 3] = [PageField::Url, PageField::Title, PageField::Body];

    pub fn name(self) -> &'static str {
        match self {
            PageField::Url => "url",
            PageField::Title => "title",
            PageField::Body => "body",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    /// Returned in search results.
    pub stored: bool,
    /// Split into terms for full-text matching; otherwise indexed as one exact term.
    pub tokenized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub field: PageField,
    pub options: FieldOptions,
}

/// Engine-independent description of the page schema. Identical for every tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSchema {
    fields: Vec<FieldDefinition>,
}

impl Default for PageSchema {
    fn default() -> Self {
        PageSchema {
            fields: vec![
                FieldDefinition {
                    field: PageField::Url,
                    options: FieldOptions {
                        stored: true,
                        tokenized: false,
                    },
                },
                FieldDefinition {
                    field: PageField::Title,
                    options: FieldOptions {
                        stored: true,
                        tokenized: true,
                    },
                },
                FieldDefinition {
                    field: PageField::Body,
                    options: FieldOptions {
                        stored: false,
                        tokenized: true,
                    },
                },
            ],
        }
    }
}

impl PageSchema {
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn get_field(&self, field: PageField) -> Option<&FieldDefinition> {
        self.fields.iter().find(|def| def.field == field)
    }

    pub fn is_stored(&self, field: PageField) -> bool {
        self.get_field(field).is_some_and(|def| def.options.stored)
    }

    /// Exact fields are stored under their own name and indexed only through
    /// a `<name>_sha256` key field.
    pub fn to_tantivy(&self) -> TantivySchema {
        let mut builder = TantivySchema::builder();
        for def in &self.fields {
            let name = def.field.name();
            match (def.options.tokenized, def.options.stored) {
                (true, true) => {
                    builder.add_text_field(name, TEXT | STORED);
                }
                (true, false) => {
                    builder.add_text_field(name, TEXT);
                }
                (false, stored) => {
                    if stored {
                        builder.add_text_field(name, STORED);
                    }
                    builder.add_text_field(&key_field_name(def.field), STRING);
                }
            }
        }
        builder.build()
    }
}

/// Name of the field holding the lookup key of an exact field.
pub fn key_field_name(field: PageField) -> String {
    format!("{}_sha256", field.name())
}

/// Fixed-length lookup key for an exact field value. tantivy drops single
/// terms longer than `MAX_TOKEN_LEN` bytes, so raw values cannot be the term.
pub fn exact_key(value: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolved tantivy field handles for one opened index.
#[derive(Debug, Clone, Copy)]
pub struct PageFields {
    pub url: Field,
    pub url_key: Field,
    pub title: Field,
    pub body: Field,
}

impl PageFields {
    pub fn resolve(tantivy_schema: &TantivySchema) -> Result<Self> {
        Ok(PageFields {
            url: get_tantivy_field(tantivy_schema, PageField::Url)?,
            url_key: tantivy_schema
                .get_field(&key_field_name(PageField::Url))
                .map_err(|_| MultiindexError::FieldNotFound(key_field_name(PageField::Url)))?,
            title: get_tantivy_field(tantivy_schema, PageField::Title)?,
            body: get_tantivy_field(tantivy_schema, PageField::Body)?,
        })
    }
}

fn get_tantivy_field(tantivy_schema: &TantivySchema, field: PageField) -> Result<Field> {
    tantivy_schema
        .get_field(field.name())
        .map_err(|_| MultiindexError::FieldNotFound(field.name().to_string()))
}
