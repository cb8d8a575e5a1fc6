use crate::domain::model::{SegmentCondition, SegmentOpts, UNITED_KINGDOM};
use crate::utils::error::NewsletterError;
use std::fmt;
use std::str::FromStr;

/// Who a campaign is sent to, expressed against the `COUNTRY` merge field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AudienceType {
    /// Subscribers whose COUNTRY is United Kingdom
    Uk,
    /// Everyone else, including subscribers with no COUNTRY
    Us,
    /// The whole list
    All,
}

impl AudienceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uk => "uk",
            Self::Us => "us",
            Self::All => "all",
        }
    }
}

impl fmt::Display for AudienceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudienceType {
    type Err = NewsletterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uk" => Ok(Self::Uk),
            "us" => Ok(Self::Us),
            "all" => Ok(Self::All),
            other => Err(NewsletterError::ValidationError {
                message: format!("invalid audience '{}', expected uk, us or all", other),
            }),
        }
    }
}

fn country_condition(op: &str) -> SegmentOpts {
    SegmentOpts {
        match_type: "all".to_string(),
        conditions: vec![SegmentCondition {
            condition_type: "SelectMerge".to_string(),
            field: "COUNTRY".to_string(),
            op: op.to_string(),
            value: UNITED_KINGDOM.to_string(),
        }],
    }
}

/// Segment filter for `audience`; `None` means the whole list.
pub fn segment_opts(audience: AudienceType) -> Option<SegmentOpts> {
    match audience {
        AudienceType::Uk => Some(country_condition("is")),
        AudienceType::Us => Some(country_condition("not")),
        AudienceType::All => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uk_segment() {
        let opts = segment_opts(AudienceType::Uk).unwrap();

        assert_eq!(opts.match_type, "all");
        assert_eq!(opts.conditions.len(), 1);
        let condition = &opts.conditions[0];
        assert_eq!(condition.condition_type, "SelectMerge");
        assert_eq!(condition.field, "COUNTRY");
        assert_eq!(condition.op, "is");
        assert_eq!(condition.value, "United Kingdom");
    }

    #[test]
    fn test_us_segment_excludes_uk() {
        let opts = segment_opts(AudienceType::Us).unwrap();

        assert_eq!(opts.match_type, "all");
        assert_eq!(opts.conditions.len(), 1);
        assert_eq!(opts.conditions[0].op, "not");
        assert_eq!(opts.conditions[0].value, "United Kingdom");
    }

    #[test]
    fn test_all_segment_has_no_filter() {
        assert!(segment_opts(AudienceType::All).is_none());
    }

    #[test]
    fn test_segment_wire_format() {
        let json = serde_json::to_value(segment_opts(AudienceType::Uk).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "match": "all",
                "conditions": [{
                    "condition_type": "SelectMerge",
                    "field": "COUNTRY",
                    "op": "is",
                    "value": "United Kingdom"
                }]
            })
        );
    }

    #[test]
    fn test_from_string() {
        assert_eq!("uk".parse::<AudienceType>().unwrap(), AudienceType::Uk);
        assert_eq!("US".parse::<AudienceType>().unwrap(), AudienceType::Us);
        assert_eq!("all".parse::<AudienceType>().unwrap(), AudienceType::All);
        assert_eq!(AudienceType::Uk.to_string(), "uk");
    }

    #[test]
    fn test_invalid_audience_type() {
        assert!("invalid".parse::<AudienceType>().is_err());
    }
}
