use std::fmt::Write;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};

use availerp_products::DEFAULT_UOM;

use crate::error::AvailabilityError;
use crate::ports::IncomingSupply;

pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Renders an [`IncomingSupply`] as `"<date> (<qty> <uom>)"`.
///
/// Quantity and unit are joined by a no-break space so the pair never wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyFormat {
    date_format: String,
    fallback_uom: String,
}

impl SupplyFormat {
    /// Rejects strftime patterns that cannot render a plain date.
    ///
    /// Time and offset fields (`%H`, `%p`, `%z`, ...) parse fine but fail at
    /// render time for a date, so the pattern is trial-rendered once.
    pub fn new(date_format: impl Into<String>) -> Result<Self, AvailabilityError> {
        let date_format = date_format.into();
        if date_format.is_empty()
            || StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error))
            || render_date(NaiveDate::MIN, &date_format).is_none()
        {
            return Err(AvailabilityError::DateFormat(date_format));
        }
        Ok(Self {
            date_format,
            fallback_uom: DEFAULT_UOM.to_string(),
        })
    }

    /// Unit shown for products whose catalog entry has none.
    pub fn with_fallback_uom(mut self, uom: impl Into<String>) -> Self {
        let uom = uom.into();
        if !uom.trim().is_empty() {
            self.fallback_uom = uom;
        }
        self
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn format(&self, supply: &IncomingSupply, uom: Option<&str>) -> String {
        let date = render_date(supply.date, &self.date_format)
            .or_else(|| render_date(supply.date, DEFAULT_DATE_FORMAT))
            .unwrap_or_else(|| supply.date.to_string());
        format!(
            "{date} ({}\u{a0}{})",
            supply.quantity,
            uom.unwrap_or(&self.fallback_uom)
        )
    }
}

/// `None` when chrono cannot render `pattern` for a date.
fn render_date(date: NaiveDate, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).ok()?;
    Some(out)
}

impl Default for SupplyFormat {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            fallback_uom: DEFAULT_UOM.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn supply() -> IncomingSupply {
        IncomingSupply {
            date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            quantity: 100,
        }
    }

    #[test]
    fn default_is_us_date_with_unit() {
        assert_eq!(
            SupplyFormat::default().format(&supply(), Some("u")),
            "03/07/2024 (100\u{a0}u)"
        );
    }

    #[test]
    fn missing_uom_falls_back_to_unit() {
        let text = SupplyFormat::default().format(&supply(), None);
        assert!(text.ends_with("(100\u{a0}u)"));
    }

    #[test]
    fn configured_fallback_unit() {
        let fmt = SupplyFormat::default().with_fallback_uom("pcs");
        assert!(fmt.format(&supply(), None).ends_with("(100\u{a0}pcs)"));
        assert_eq!(fmt.format(&supply(), Some("kg")), "03/07/2024 (100\u{a0}kg)");
        let blank = SupplyFormat::default().with_fallback_uom("  ");
        assert!(blank.format(&supply(), None).ends_with("\u{a0}u)"));
    }

    #[test]
    fn custom_date_format() {
        let fmt = SupplyFormat::new("%Y-%m-%d").unwrap();
        assert_eq!(fmt.format(&supply(), Some("kg")), "2024-03-07 (100\u{a0}kg)");
    }

    #[test]
    fn broken_patterns_are_rejected() {
        assert!(matches!(
            SupplyFormat::new("%Q"),
            Err(AvailabilityError::DateFormat(_))
        ));
        assert!(SupplyFormat::new("").is_err());
    }

    #[test]
    fn time_fields_are_rejected() {
        for pattern in ["%H:%M", "%m/%d %p", "%Y-%m-%d %S", "%z"] {
            assert!(
                matches!(SupplyFormat::new(pattern), Err(AvailabilityError::DateFormat(p)) if p == pattern),
                "{pattern} should be rejected"
            );
        }
    }

    #[test]
    fn unrenderable_pattern_falls_back_to_default() {
        let fmt = SupplyFormat {
            date_format: "%H:%M".to_string(),
            fallback_uom: "u".to_string(),
        };
        assert_eq!(fmt.format(&supply(), None), "03/07/2024 (100\u{a0}u)");
    }
}
