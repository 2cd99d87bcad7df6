//! Common types for casedrop: the reward catalog, player and session state,
//! signed transactions, and the binary API envelope shared by the engine,
//! server, and client.

mod admin;
mod api;
mod codec;
mod constants;
mod ops;
mod player;
mod reward;
mod session;

pub use admin::*;
pub use api::*;
pub use codec::{
    read_string, read_string_list, string_encode_size, string_list_encode_size, write_string,
    write_string_list,
};
pub use constants::*;
pub use ops::*;
pub use player::*;
pub use reward::*;
pub use session::*;
