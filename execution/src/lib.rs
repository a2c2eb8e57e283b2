pub mod casino;
pub mod sessions;

mod layer;

mod state;

mod store;

pub use layer::Layer;
pub use state::{load_account, load_pool, load_settings, State, Status};
pub use store::{CasinoSection, Document, FileStore, LotterySection, StoreError};
