pub mod data;
pub mod defaults;
pub mod env;
pub mod io;
pub mod printing;
