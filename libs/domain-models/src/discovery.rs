// [libs/domain-models/src/discovery.rs]
//! In-memory table entry for an announced mDNS service (component F).

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryProfile {
    pub service_type: String,
    pub instance_id: String,
    pub port: u16,
    pub txt_properties: BTreeMap<String, String>,
}

impl DiscoveryProfile {
    /// Composite key `service-type:instance-id:port` per spec.md §3.
    pub fn composite_key(&self) -> String {
        format!("{}:{}:{}", self.service_type, self.instance_id, self.port)
    }
}
