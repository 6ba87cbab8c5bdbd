use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::charges::Address;

/// Decides whether an address is in a jurisdiction we collect tax for
pub trait JurisdictionPolicy: Send + Sync {
    fn requires_tax(&self, address: &Address) -> bool;
}

/// A taxable region as configured, e.g. `{ code = "GA", aliases = ["Georgia"] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxableRegion {
    pub code: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TaxableRegion {
    pub fn code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            aliases: Vec::new(),
        }
    }
}

/// Taxes an address when its region matches a configured code or alias, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct RegionSetPolicy {
    names: HashSet<String>,
}

impl RegionSetPolicy {
    pub fn new(regions: impl IntoIterator<Item = TaxableRegion>) -> Self {
        let names = regions
            .into_iter()
            .flat_map(|region| std::iter::once(region.code).chain(region.aliases))
            .map(|name| normalize(&name))
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl JurisdictionPolicy for RegionSetPolicy {
    fn requires_tax(&self, address: &Address) -> bool {
        self.names.contains(&normalize(&address.region))
    }
}

fn normalize(region: &str) -> String {
    region.trim().to_uppercase()
}
