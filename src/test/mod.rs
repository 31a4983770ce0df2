mod db;
mod passwords;
mod utils;

pub use utils::test_utils;
