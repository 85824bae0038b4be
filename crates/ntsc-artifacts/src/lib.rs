pub mod composite;
pub mod fft;
mod filter;
mod noise;
pub mod ntsc;
pub mod random;
pub mod ringing;
pub mod settings;
mod shift;
pub mod thread_pool;
mod vhs;
pub mod yiq_fielding;

#[macro_use]
extern crate num_derive;

pub use ntsc::{NtscProcessor, process_image};
pub use num_traits::cast::{FromPrimitive, ToPrimitive};
pub use settings::{NtscConfig, Preset, SettingsList};
