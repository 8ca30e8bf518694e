pub mod convert;
pub mod road;
pub mod simplify;
