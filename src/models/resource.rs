use serde::{Deserialize, Serialize};

/// Third-party directory a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    LocalPups,
    LocalOrgs,
    Charities,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::LocalPups => "local_pups",
            ResourceKind::LocalOrgs => "local_orgs",
            ResourceKind::Charities => "charities",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local_pups" => Some(ResourceKind::LocalPups),
            "local_orgs" => Some(ResourceKind::LocalOrgs),
            "charities" => Some(ResourceKind::Charities),
            _ => None,
        }
    }
}

/// Raw records as returned by the directory API
#[derive(Debug, Deserialize)]
pub struct ResourceRecordsRequest {
    #[serde(default)]
    pub records: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ResourceRecordsResponse {
    pub kind: ResourceKind,
    pub records: Vec<serde_json::Value>,
}
