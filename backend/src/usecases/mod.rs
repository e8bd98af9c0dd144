pub mod artwork;
pub mod proof_lifecycle;
pub mod proof_photos;
pub mod seed_dispatch;
pub mod seeds;
