//! Label-anchored field lookup
//!
//! Profile pages lay out each field as a table row: a cell with a bold label
//! (`<td><b>Office Ph:</b></td>`) followed by a cell holding the value. A label is
//! resolved by finding the first such cell in document order and reading its
//! next sibling cell. Lookups never retry; surface errors go to the caller.

use crate::browser::{Locator, ScrapeSurface};
use crate::directory::record::{FieldName, Record};
use crate::error::Result;

/// Value cell following the bold `label`
pub fn label_value_locator(label: &str) -> Locator {
    Locator::xpath(format!("//td[b[contains(text(), {})]]/following-sibling::td[1]", xpath_literal(label)))
}

/// Links nested in the value cell following the bold `label`
pub fn label_link_locator(label: &str) -> Locator {
    Locator::xpath(format!("//td[b[contains(text(), {})]]/following-sibling::td[1]//a", xpath_literal(label)))
}

/// Trimmed text of the value cell for `label`, or "" when the label is absent
pub fn lookup_label<S: ScrapeSurface + ?Sized>(surface: &S, label: &str) -> Result<String> {
    let text = surface.text_content(&label_value_locator(label), 0)?;
    Ok(text.map(|t| t.trim().to_string()).unwrap_or_default())
}

/// Address of the first link in the value cell (`mailto:` removed), falling back to its text
pub fn lookup_link_address<S: ScrapeSurface + ?Sized>(surface: &S, label: &str) -> Result<String> {
    match link_href(surface, label)? {
        Some(href) => Ok(href.trim().trim_start_matches("mailto:").trim().to_string()),
        None => lookup_label(surface, label),
    }
}

/// Target of the first link in the value cell as written, falling back to its text
pub fn lookup_link_display<S: ScrapeSurface + ?Sized>(surface: &S, label: &str) -> Result<String> {
    match link_href(surface, label)? {
        Some(href) => Ok(href.trim().to_string()),
        None => lookup_label(surface, label),
    }
}

/// `None` when the cell has no link; a link without `href` yields `Some("")`
fn link_href<S: ScrapeSurface + ?Sized>(surface: &S, label: &str) -> Result<Option<String>> {
    let links = label_link_locator(label);
    if surface.count(&links)? == 0 {
        return Ok(None);
    }
    Ok(Some(surface.attribute(&links, 0, "href")?.unwrap_or_default()))
}

/// Read all seven fields from a profile surface
pub fn extract_record<S: ScrapeSurface + ?Sized>(surface: &S) -> Result<Record> {
    let mut record = Record::default();

    for field in FieldName::ALL {
        let value = match field {
            FieldName::Email => lookup_link_address(surface, field.label())?,
            FieldName::Website => lookup_link_display(surface, field.label())?,
            _ => lookup_label(surface, field.label())?,
        };

        if value.is_empty() {
            log::debug!("No value for '{}'", field.label());
        }
        record.set(field, value);
    }

    Ok(record)
}

/// Quote `s` for use in an XPath 1.0 expression
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|part| format!("'{}'", part)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeElement, FakeSurface};

    #[test]
    fn test_value_locator_shape() {
        assert_eq!(
            label_value_locator("Name:"),
            Locator::xpath("//td[b[contains(text(), 'Name:')]]/following-sibling::td[1]")
        );
    }

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("Name:"), "'Name:'");
        assert_eq!(xpath_literal("O'Brien"), "\"O'Brien\"");
        assert_eq!(xpath_literal(r#"a'b"c"#), r#"concat('a', "'", 'b"c')"#);
    }

    #[test]
    fn test_lookup_label_trims() {
        let surface = FakeSurface::default().with(label_value_locator("Office:"), FakeElement::text("  Lake Realty \n"));
        assert_eq!(lookup_label(&surface, "Office:").unwrap(), "Lake Realty");
    }

    #[test]
    fn test_lookup_label_missing_is_empty() {
        let surface = FakeSurface::default();
        assert_eq!(lookup_label(&surface, "Cell Ph:").unwrap(), "");
    }

    #[test]
    fn test_first_match_wins() {
        let surface = FakeSurface::default()
            .with(label_value_locator("Name:"), FakeElement::text("First"))
            .with(label_value_locator("Name:"), FakeElement::text("Second"));
        assert_eq!(lookup_label(&surface, "Name:").unwrap(), "First");
    }

    #[test]
    fn test_link_address_strips_mailto() {
        let surface = FakeSurface::default()
            .with(label_value_locator("E-mail:"), FakeElement::text("Email me"))
            .with(label_link_locator("E-mail:"), FakeElement::link("mailto:jane@example.com "));
        assert_eq!(lookup_link_address(&surface, "E-mail:").unwrap(), "jane@example.com");
    }

    #[test]
    fn test_link_falls_back_to_text() {
        let surface = FakeSurface::default().with(label_value_locator("Website:"), FakeElement::text(" www.lake.example "));
        assert_eq!(lookup_link_display(&surface, "Website:").unwrap(), "www.lake.example");
        assert_eq!(lookup_link_address(&surface, "Website:").unwrap(), "www.lake.example");
    }

    #[test]
    fn test_link_display_keeps_href() {
        let surface = FakeSurface::default()
            .with(label_value_locator("Website:"), FakeElement::text("Visit"))
            .with(label_link_locator("Website:"), FakeElement::link("https://lake.example/"));
        assert_eq!(lookup_link_display(&surface, "Website:").unwrap(), "https://lake.example/");
    }

    #[test]
    fn test_link_without_href_is_empty() {
        let surface = FakeSurface::default()
            .with(label_value_locator("E-mail:"), FakeElement::text("hidden"))
            .with(label_link_locator("E-mail:"), FakeElement::text("no href"));
        assert_eq!(lookup_link_address(&surface, "E-mail:").unwrap(), "");
    }

    #[test]
    fn test_extract_record() {
        let surface = FakeSurface::profile(&[
            ("Name:", "Jane Doe"),
            ("Office:", "Lake Realty"),
            ("Office Ph:", "530-555-0100"),
        ])
        .with(label_link_locator("E-mail:"), FakeElement::link("mailto:jane@example.com"));

        let record = extract_record(&surface).unwrap();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.office, "Lake Realty");
        assert_eq!(record.office_phone, "530-555-0100");
        assert_eq!(record.email, "jane@example.com");
        assert_eq!(record.cell_phone, "");
        assert_eq!(record.website, "");
    }

    #[test]
    fn test_surface_errors_propagate() {
        let surface = FakeSurface::failing();
        assert!(extract_record(&surface).is_err());
    }
}
