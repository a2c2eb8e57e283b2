mod account;
mod constants;
mod game;
mod leaderboard;
mod loan;
mod pool;
mod settings;

pub use account::*;
pub use constants::*;
pub use game::*;
pub use leaderboard::*;
pub use loan::*;
pub use pool::*;
pub use settings::*;

#[cfg(test)]
mod tests;
