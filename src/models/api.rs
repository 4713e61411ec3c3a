//! Response bodies of the Mini App API.

use serde::{Deserialize, Serialize};

/// GET /api/check-admin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
}

/// GET /api/ton-address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationAddress {
    pub address: String,
}

/// POST /api/data acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteAck {
    pub success: bool,
    /// Revision of the record that is now stored
    pub revision: String,
}
