pub mod assembler;
pub mod csv_log;
pub mod delivery;
pub mod driver;
pub mod identity;
pub mod poll;
pub mod reading;
pub mod registry;
pub mod sensor;
