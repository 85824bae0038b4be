mod presets;
pub mod settings;
pub mod standard;

pub use presets::Preset;
pub use settings::*;
pub use standard::*;
