use crate::error::BrowserError;
use std::fmt;
use url::Url;

/// Absolute address of one member's profile page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryReference(String);

impl EntryReference {
    /// Resolve a (possibly relative) link against `base`
    pub fn resolve(base: &Url, href: &str) -> Option<Self> {
        base.join(href.trim()).ok().map(|url| Self(url.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Url> for EntryReference {
    fn from(url: Url) -> Self {
        Self(url.into())
    }
}

/// The seven exported profile fields, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Name,
    Office,
    Address,
    OfficePhone,
    CellPhone,
    Email,
    Website,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::Name,
        FieldName::Office,
        FieldName::Address,
        FieldName::OfficePhone,
        FieldName::CellPhone,
        FieldName::Email,
        FieldName::Website,
    ];

    /// CSV column header
    pub fn header(self) -> &'static str {
        match self {
            FieldName::Name => "Name",
            FieldName::Office => "Office",
            FieldName::Address => "Address",
            FieldName::OfficePhone => "Office phone",
            FieldName::CellPhone => "Cell phone",
            FieldName::Email => "E-mail",
            FieldName::Website => "Website",
        }
    }

    /// Bold label preceding the value on a profile page
    pub fn label(self) -> &'static str {
        match self {
            FieldName::Name => "Name:",
            FieldName::Office => "Office:",
            FieldName::Address => "Address:",
            FieldName::OfficePhone => "Office Ph:",
            FieldName::CellPhone => "Cell Ph:",
            FieldName::Email => "E-mail:",
            FieldName::Website => "Website:",
        }
    }
}

/// One member's contact details. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub office: String,
    pub address: String,
    pub office_phone: String,
    pub cell_phone: String,
    pub email: String,
    pub website: String,
}

impl Record {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.name,
            FieldName::Office => &self.office,
            FieldName::Address => &self.address,
            FieldName::OfficePhone => &self.office_phone,
            FieldName::CellPhone => &self.cell_phone,
            FieldName::Email => &self.email,
            FieldName::Website => &self.website,
        }
    }

    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let slot = match field {
            FieldName::Name => &mut self.name,
            FieldName::Office => &mut self.office,
            FieldName::Address => &mut self.address,
            FieldName::OfficePhone => &mut self.office_phone,
            FieldName::CellPhone => &mut self.cell_phone,
            FieldName::Email => &mut self.email,
            FieldName::Website => &mut self.website,
        };
        *slot = value.into();
    }

    /// Builder method: set one field
    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// True when every field is empty; such records are never exported
    pub fn is_empty(&self) -> bool {
        FieldName::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Field values in column order
    pub fn values(&self) -> [&str; 7] {
        FieldName::ALL.map(|field| self.get(field))
    }
}

/// Result of scraping one entry: exactly one per reference
#[derive(Debug)]
pub enum ScrapeOutcome {
    Scraped(Record),
    DefinitiveFailure {
        reference: EntryReference,
        attempts: u32,
        last_error: BrowserError,
    },
}

impl ScrapeOutcome {
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Scraped(record) => Some(record),
            Self::DefinitiveFailure { .. } => None,
        }
    }

    /// The record, if the scrape succeeded and found at least one field
    pub fn into_exportable(self) -> Option<Record> {
        match self {
            Self::Scraped(record) if !record.is_empty() => Some(record),
            _ => None,
        }
    }
}
