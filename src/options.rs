//! Pass construction options.

use serde::{Deserialize, Serialize};

use crate::hashing::DigestAlgorithm;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassOptions {
    /// Accept `http://` web service URLs. Devices only allow this in
    /// developer mode.
    #[serde(default)]
    pub allow_http: bool,
    #[serde(default)]
    pub digest: DigestAlgorithm,
}
