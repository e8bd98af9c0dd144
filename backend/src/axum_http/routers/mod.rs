pub mod proofs;
pub mod provider_webhook;
pub mod seeds;
