//! Infrastructure configuration modules.

pub mod confirmation;
pub mod logging;
pub mod settings;
pub mod wallet;
