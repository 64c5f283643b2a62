mod keys;
mod signer;

pub use keys::{CosmosWallet, COSMOS_HD_PATH, DEFAULT_ADDRESS_PREFIX};
pub use signer::LocalSigner;
