pub mod abi;
pub mod arg_path;
pub mod draft;
pub mod proposal;
pub mod transaction;
