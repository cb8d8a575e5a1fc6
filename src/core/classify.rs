//! Lookup-table classification of subscribers: country inference from email
//! domains and tags, country-code mapping, and DC/DMV membership.

use crate::config::settings::CountryMapping;
use crate::domain::model::{email_domain, Member, UNITED_KINGDOM, UNITED_STATES};
use std::collections::BTreeMap;

const UK_DOMAIN_PATTERNS: [&str; 5] = [".uk", ".ac.uk", ".gov.uk", ".co.uk", ".org.uk"];
const DMV_REGIONS: [&str; 3] = ["DC", "VA", "MD"];
const DC_REGION_SPELLINGS: [&str; 3] = ["DC", "D.C.", "DISTRICT OF COLUMBIA"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryGuess {
    pub country: Option<String>,
    pub reason: String,
}

impl CountryGuess {
    fn found(country: &str, reason: String) -> Self {
        Self {
            country: Some(country.to_string()),
            reason,
        }
    }
}

/// Guess a subscriber's country from tags first, then the email domain.
pub fn infer_country(email: &str, tags: &[String], mapping: &CountryMapping) -> CountryGuess {
    let domain = email_domain(email);

    if !tags.is_empty() {
        let joined = tags
            .iter()
            .map(|t| t.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        for tag in &mapping.us_tags {
            if joined.contains(&tag.to_lowercase()) {
                return CountryGuess::found(UNITED_STATES, format!("Tag: {}", tag));
            }
        }
    }

    if UK_DOMAIN_PATTERNS.iter().any(|p| domain.contains(p)) {
        return CountryGuess::found(UNITED_KINGDOM, "UK domain".to_string());
    }

    if domain.ends_with(".edu") || domain.ends_with(".gov") {
        return CountryGuess::found(UNITED_STATES, "US domain (.edu/.gov)".to_string());
    }

    if domain.ends_with(".us") {
        return CountryGuess::found(UNITED_STATES, "US domain (.us)".to_string());
    }

    if let Some(org) = mapping.uk_organizations.iter().find(|org| domain.contains(org.as_str())) {
        return CountryGuess::found(UNITED_KINGDOM, format!("UK org: {}", org));
    }

    if let Some(org) = mapping.us_organizations.iter().find(|org| domain.contains(org.as_str())) {
        return CountryGuess::found(UNITED_STATES, format!("US org: {}", org));
    }

    CountryGuess {
        country: None,
        reason: "Unknown (generic domain)".to_string(),
    }
}

pub fn country_for_code<'a>(codes: &'a BTreeMap<String, String>, code: &str) -> Option<&'a str> {
    codes.get(code).map(String::as_str)
}

pub fn is_dc_region(region: &str) -> bool {
    let region = region.to_uppercase();
    DC_REGION_SPELLINGS.contains(&region.as_str())
}

pub fn is_dmv_region(region: &str) -> bool {
    DMV_REGIONS.contains(&region)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmvMatch {
    /// Organization name when the domain is a known DC organization.
    pub organization: Option<String>,
    pub reasons: Vec<String>,
}

impl DmvMatch {
    pub fn reason(&self) -> String {
        self.reasons.join(" | ")
    }
}

/// Decide whether a member belongs to the DC/Maryland/Virginia area.
///
/// A US location in DC, VA or MD always qualifies. Working at a DC
/// organization qualifies unless the location places the member elsewhere
/// in the US.
pub fn classify_dmv(member: &Member, dc_organizations: &BTreeMap<String, String>) -> Option<DmvMatch> {
    let region = member.location.region.to_uppercase();
    let country_code = member.location.country_code.as_str();
    let domain = member.domain();

    let in_us = country_code == "US";
    let located_in_dmv = in_us && is_dmv_region(&region);
    let outside_dmv = in_us && !region.is_empty() && !is_dmv_region(&region);

    let mut reasons = Vec::new();
    if located_in_dmv {
        reasons.push(format!("Located in {}", region));
    }

    let organization = dc_organizations.get(&domain).cloned();
    if let Some(org) = &organization {
        if !outside_dmv {
            reasons.push(format!("Works at {}", org));
        }
    }

    if reasons.is_empty() {
        return None;
    }
    Some(DmvMatch {
        organization,
        reasons,
    })
}
