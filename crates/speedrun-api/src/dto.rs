use serde::Deserialize;
use speedrun_types::common::{parse_address, parse_bytes32};
use validator::{Validate, ValidationError};

/// Query parameters for `GET /intents`, per §6. `page`/`page_size` are
/// clamped downstream by [`speedrun_storage::Pagination::new`] regardless of
/// what's supplied here.
#[derive(Debug, Deserialize)]
pub struct ListIntentsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source_chain: Option<u64>,
    #[serde(default)]
    pub destination_chain: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Body for the optional manual-ingest path, `POST /intents` (§4.G/§6).
/// Amounts and hashes travel as hex/decimal strings over the wire and are
/// parsed here rather than trusted as already-valid binary.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    #[validate(custom(function = "validate_bytes32_hex"))]
    pub intent_id: String,
    pub source_chain: u64,
    pub destination_chain: u64,
    #[validate(custom(function = "validate_address_hex"))]
    pub token: String,
    pub amount: String,
    pub tip: String,
    #[validate(custom(function = "validate_address_hex"))]
    pub sender: String,
    #[validate(custom(function = "validate_address_hex"))]
    pub recipient: String,
    #[serde(default)]
    pub is_call: bool,
}

impl CreateIntentRequest {
    /// Cross-field check `validator`'s derive can't express on its own —
    /// mirrors [`speedrun_types::model::Intent::validate_invariants`].
    pub fn validate_chains_differ(&self) -> Result<(), ValidationError> {
        if self.source_chain == self.destination_chain {
            let mut err = ValidationError::new("chain_mismatch");
            err.message = Some("source_chain must differ from destination_chain".into());
            return Err(err);
        }
        Ok(())
    }
}

fn validate_address_hex(value: &str) -> Result<(), ValidationError> {
    parse_address(value).map(|_| ()).map_err(|_| ValidationError::new("invalid_address"))
}

fn validate_bytes32_hex(value: &str) -> Result<(), ValidationError> {
    parse_bytes32(value).map(|_| ()).map_err(|_| ValidationError::new("invalid_bytes32"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateIntentRequest {
        CreateIntentRequest {
            intent_id: "0x".to_string() + &"11".repeat(32),
            source_chain: 1,
            destination_chain: 10,
            token: "0x".to_string() + &"22".repeat(20),
            amount: "1000".to_string(),
            tip: "0".to_string(),
            sender: "0x".to_string() + &"33".repeat(20),
            recipient: "0x".to_string() + &"44".repeat(20),
            is_call: false,
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        let req = valid_request();
        assert!(req.validate().is_ok());
        assert!(req.validate_chains_differ().is_ok());
    }

    #[test]
    fn rejects_malformed_address() {
        let mut req = valid_request();
        req.sender = "not-an-address".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_matching_chains() {
        let mut req = valid_request();
        req.destination_chain = req.source_chain;
        assert!(req.validate_chains_differ().is_err());
    }
}
