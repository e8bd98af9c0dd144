pub mod addresses;
pub mod enums;
pub mod postcards;
pub mod proof_transitions;
pub mod proofs;
pub mod provider_errors;
pub mod provider_webhook;
pub mod public_codes;
pub mod scans;
pub mod seeds;
