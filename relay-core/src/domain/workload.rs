//! Workload domain model
//!
//! A running compute workload as reported by the workload listing API.
//! Nodes are only discovered here, never provisioned.

use serde::{Deserialize, Serialize};

/// Domain suffix appended to bare node names
pub const NODE_DOMAIN: &str = "comput3.ai";

/// A running workload hosting one upstream node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Host name of the node running the workload
    pub node: String,

    /// Workload type, e.g. `media:fast`
    #[serde(rename = "type", default)]
    pub workload_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Workload {
    /// Whether this workload serves media generation
    pub fn is_media(&self) -> bool {
        self.workload_type.starts_with("media")
    }

    /// Whether this is a fast-tier instance
    pub fn is_fast(&self) -> bool {
        self.workload_type.ends_with("fast")
    }

    /// Node identifier of the workload's UI host, suitable for the gateway path
    pub fn ui_node(&self) -> String {
        if self.node.contains(NODE_DOMAIN) {
            format!("ui-{}", self.node)
        } else {
            format!("ui-{}.{}", self.node, NODE_DOMAIN)
        }
    }
}
