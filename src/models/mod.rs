pub mod agenda;
pub mod appointment;
pub mod clinic;
pub mod enums;
pub mod license;
pub mod no_show;
pub mod patient;

pub use agenda::*;
pub use appointment::*;
pub use clinic::*;
pub use enums::*;
pub use license::*;
pub use no_show::*;
pub use patient::*;
