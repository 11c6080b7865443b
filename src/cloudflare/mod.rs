//! Cloudflare integration for the rule export.
//! This module provides the API client, zone enumeration and
//! custom firewall ruleset retrieval.

mod client;
mod rules;
mod zones;

pub use client::{
    CloudflareClient, CloudflareError, CloudflareResponse, FirewallRule, Ruleset, Zone,
    ZoneAccount, ZoneRecord, CUSTOM_FIREWALL_PHASE,
};
pub use rules::RuleFetcher;
pub use zones::{filter_by_account, EnumerationOutcome, ZoneEnumeration, ZoneEnumerator};
